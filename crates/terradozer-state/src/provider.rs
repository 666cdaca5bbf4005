/// Reduce a state file's provider reference to the short name the Plugin
/// Host resolves against its registry.
///
/// Handles both dialects' shapes:
/// - v3: `provider.aws` or `provider.aws.west` (aliased)
/// - v4: `provider["registry.terraform.io/hashicorp/aws"]` or with a
///   trailing `.alias`
pub fn normalize(raw: &str) -> String {
    if let (Some(start), Some(end)) = (raw.find('"'), raw.rfind('"')) {
        // v4: provider["registry.terraform.io/hashicorp/aws"] or ...].alias
        let address = &raw[start + 1..end];
        return address.rsplit('/').next().unwrap_or(address).to_string();
    }

    // v3: provider.aws or provider.aws.alias — alias has no bearing on the
    // short name the Plugin Host resolves against.
    let without_provider = raw.trim_start_matches("provider.");
    without_provider.split('.').next().unwrap_or(without_provider).to_string()
}
