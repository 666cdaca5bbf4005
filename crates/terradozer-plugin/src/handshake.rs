/// A parsed go-plugin handshake line:
/// `CORE-PROTOCOL-VERSION|APP-PROTOCOL-VERSION|NETWORK-TYPE|ADDRESS|PROTOCOL[|CERT]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub core_protocol_version: u32,
    pub app_protocol_version: u32,
    pub network_type: String,
    pub address: String,
    pub protocol: String,
    pub client_cert: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("handshake line has {0} fields, need at least 5")]
    TooFewFields(usize),
    #[error("handshake core protocol version {0} is not a number")]
    BadCoreVersion(String),
    #[error("handshake app protocol version {0} is not a number")]
    BadAppVersion(String),
}

pub fn parse(line: &str) -> Result<Handshake, HandshakeError> {
    let fields: Vec<&str> = line.trim().split('|').collect();
    if fields.len() < 5 {
        return Err(HandshakeError::TooFewFields(fields.len()));
    }

    let core_protocol_version = fields[0]
        .parse()
        .map_err(|_| HandshakeError::BadCoreVersion(fields[0].to_string()))?;
    let app_protocol_version = fields[1]
        .parse()
        .map_err(|_| HandshakeError::BadAppVersion(fields[1].to_string()))?;

    Ok(Handshake {
        core_protocol_version,
        app_protocol_version,
        network_type: fields[2].to_string(),
        address: fields[3].to_string(),
        protocol: fields[4].to_string(),
        client_cert: fields.get(5).map(|s| s.to_string()),
    })
}
