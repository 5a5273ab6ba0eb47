pub mod server;
pub mod upstream;

pub use server::ProxyServer;
pub use upstream::UdpExchange;
