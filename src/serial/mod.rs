//! Serial transport and port session

mod port;
mod session;

pub use port::{SerialLink, SerialPortConnector};
pub use session::PortSession;
