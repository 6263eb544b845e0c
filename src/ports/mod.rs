//! Port selection for the app and asset servers

use std::net::TcpListener;

use anyhow::Result;
use tracing::debug;

/// How many ports past the requested one are tried
pub const PORT_SEARCH_LIMIT: u16 = 20;

/// Ports chosen for a development session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ports {
    /// Server-rendered app
    pub app: u16,
    /// Built assets and the HMR socket
    pub assets: u16,
}

/// Check whether a port can currently be bound on the host
pub fn is_available(host: &str, port: u16) -> bool {
    TcpListener::bind((host, port)).is_ok()
}

/// First bindable port at or after `preferred`
pub fn choose_port(host: &str, preferred: u16) -> Result<u16> {
    let last = preferred.saturating_add(PORT_SEARCH_LIMIT);
    for port in preferred..=last {
        if is_available(host, port) {
            if port != preferred {
                debug!("Port {} is busy, using {}", preferred, port);
            }
            return Ok(port);
        }
    }
    anyhow::bail!("No free port between {} and {} on {}", preferred, last, host)
}

/// App port at or after `preferred`, with the asset port right after it
pub fn choose_ports(host: &str, preferred: u16) -> Result<Ports> {
    let mut start = preferred;
    loop {
        let app = choose_port(host, start)?;
        let Some(assets) = app.checked_add(1) else {
            anyhow::bail!("No free port pair at or after {} on {}", preferred, host);
        };
        if is_available(host, assets) {
            return Ok(Ports { app, assets });
        }
        if assets.saturating_sub(preferred) > PORT_SEARCH_LIMIT {
            anyhow::bail!("No free port pair at or after {} on {}", preferred, host);
        }
        let Some(next) = assets.checked_add(1) else {
            anyhow::bail!("No free port pair at or after {} on {}", preferred, host);
        };
        start = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_port() -> u16 {
        TcpListener::bind(("127.0.0.1", 0)).unwrap().local_addr().unwrap().port()
    }

    #[test]
    fn test_busy_port_is_skipped() {
        let busy = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = busy.local_addr().unwrap().port();

        let chosen = choose_port("127.0.0.1", port).unwrap();
        assert_ne!(chosen, port);
        assert!(chosen > port);
    }

    #[test]
    fn test_free_port_is_kept() {
        let port = free_port();
        assert_eq!(choose_port("127.0.0.1", port).unwrap(), port);
    }

    #[test]
    fn test_pair_is_adjacent() {
        let ports = choose_ports("127.0.0.1", free_port()).unwrap();
        assert_eq!(ports.assets, ports.app + 1);
    }

    #[test]
    fn test_pair_search_stops_at_top_of_range() {
        // Without the top port held there is nothing to check
        let Ok(_held) = TcpListener::bind(("127.0.0.1", u16::MAX)) else {
            return;
        };

        let err = choose_ports("127.0.0.1", u16::MAX - 1).unwrap_err();
        assert!(err.to_string().contains("No free port"));
    }
}
