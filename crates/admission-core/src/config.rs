//! Startup flags shared by every webhook binary

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Args;

use crate::server::ServerConfig;
use crate::DEFAULT_WEBHOOK_PORT;

/// TLS and listener flags, flattened into each binary's CLI
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// File containing the x509 certificate for HTTPS (CA cert, if any, concatenated after the server cert)
    #[arg(long = "tls-cert-file", env = "TLS_CERT_FILE")]
    pub tls_cert_file: PathBuf,

    /// File containing the x509 private key matching --tls-cert-file
    #[arg(long = "tls-private-key-file", env = "TLS_PRIVATE_KEY_FILE")]
    pub tls_private_key_file: PathBuf,

    /// Secure port that the webhook listens on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_WEBHOOK_PORT)]
    pub port: u16,
}

impl ServeArgs {
    /// Resolve into a server configuration listening on all interfaces
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port)),
            cert_file: self.tls_cert_file.clone(),
            key_file: self.tls_private_key_file.clone(),
        }
    }
}
