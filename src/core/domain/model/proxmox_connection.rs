use crate::core::domain::value_object::{
    ProxmoxApiToken, ProxmoxHost, ProxmoxPassword, ProxmoxPort, ProxmoxRealm, ProxmoxUrl,
    ProxmoxUsername,
};

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum ProxmoxCredentials {
    /// Ticket login with username, password and realm.
    Password {
        username: ProxmoxUsername,
        password: ProxmoxPassword,
        realm: ProxmoxRealm,
    },
    /// Stateless API token.
    Token(ProxmoxApiToken),
}

/// Everything needed to reach and authenticate against one API endpoint.
#[derive(Debug, Clone)]
pub struct ProxmoxConnection {
    host: ProxmoxHost,
    port: ProxmoxPort,
    credentials: ProxmoxCredentials,
    secure: bool,
    url: ProxmoxUrl,
}

impl ProxmoxConnection {
    pub fn new(
        host: ProxmoxHost,
        port: ProxmoxPort,
        credentials: ProxmoxCredentials,
        secure: bool,
        url: ProxmoxUrl,
    ) -> Self {
        Self {
            host,
            port,
            credentials,
            secure,
            url,
        }
    }

    pub fn host(&self) -> &ProxmoxHost {
        &self.host
    }

    pub fn port(&self) -> &ProxmoxPort {
        &self.port
    }

    pub fn credentials(&self) -> &ProxmoxCredentials {
        &self.credentials
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn url(&self) -> &ProxmoxUrl {
        &self.url
    }
}
