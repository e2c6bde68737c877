use std::net::IpAddr;

/// The servers found so far, in the order they first answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRegistry {
    servers: Vec<IpAddr>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `addr`. Returns `false` if it was already known.
    pub fn record(&mut self, addr: IpAddr) -> bool {
        if self.servers.contains(&addr) {
            return false;
        }
        self.servers.push(addr);
        true
    }

    pub fn servers(&self) -> &[IpAddr] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn reset(&mut self) {
        self.servers.clear();
    }
}
