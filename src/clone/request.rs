/// Tenant-specific values for the new site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    pub name: String,
    pub host: String,
    /// Site group id; empty when the site is ungrouped.
    pub group: Option<String>,
}

impl CloneRequest {
    pub fn new(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            group: None,
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}
