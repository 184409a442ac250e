use std::fmt;
use std::str::FromStr;

/// Which end of the link this process is.
///
/// The role decides which FIFO is read and which is written, so the two ends
/// of one link always see each other's writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

/// One of the two FIFOs backing a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to server.
    Miso,
    /// Server to client.
    Mosi,
}

impl Role {
    /// The FIFO this role reads from.
    pub fn read_direction(self) -> Direction {
        match self {
            Role::Client => Direction::Mosi,
            Role::Server => Direction::Miso,
        }
    }

    /// The FIFO this role writes to.
    pub fn write_direction(self) -> Direction {
        match self {
            Role::Client => Direction::Miso,
            Role::Server => Direction::Mosi,
        }
    }

    /// The role at the other end of the link.
    pub fn peer(self) -> Role {
        match self {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "server" => Ok(Role::Server),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
