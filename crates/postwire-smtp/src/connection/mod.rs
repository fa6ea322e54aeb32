//! Transport and command/response exchange.

mod protocol;
mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use protocol::{Protocol, READ_BUFFER_SIZE};
pub use stream::{Connect, SmtpStream, Transport, connect, connect_tls};
