//! Typed parsers over probe command output.
//!
//! Every platform text-format quirk is confined here. A value that
//! cannot be located parses to `None` (or drops the line), never to
//! zero: a failed measurement is no evidence, not a good reading.

use std::collections::HashMap;
use std::net::IpAddr;

/// Extracts the round-trip time in milliseconds from ping output.
///
/// Matches the `time=12.4 ms` (unix) and `time=12ms` (Windows) forms.
/// Sub-millisecond Windows replies print `time<1ms` and yield `None`.
pub fn parse_rtt_ms(output: &str) -> Option<f64> {
    let start = output.find("time=")? + "time=".len();
    let rest = &output[start..];
    let end = rest.find("ms")?;
    rest[..end].trim().parse::<f64>().ok()
}

/// Extracts the packet-loss percentage from ping output.
///
/// Matches `0% packet loss` / `0.0% packet loss` (unix) and
/// `(25% loss)` (Windows) by locating the percent sign and reading the
/// number in front of it.
pub fn parse_loss_pct(output: &str) -> Option<f64> {
    let idx = output
        .find("% packet loss")
        .or_else(|| output.find("% loss"))?;
    let head = &output[..idx];
    let num_len = head
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .count();
    head[head.len() - num_len..].parse::<f64>().ok()
}

/// Tallies active connections per remote IP from netstat output.
///
/// Lines with fewer than five columns (headers, UNIX sockets) are
/// skipped, as is any foreign-address column that does not contain a
/// parseable IP. Results are sorted by address for deterministic
/// iteration.
pub fn parse_connection_counts(output: &str) -> Vec<(IpAddr, u32)> {
    let mut counts: HashMap<IpAddr, u32> = HashMap::new();
    for line in output.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() > 4 {
            if let Some(ip) = parse_peer_addr(cols[4]) {
                *counts.entry(ip).or_insert(0) += 1;
            }
        }
    }
    let mut list: Vec<(IpAddr, u32)> = counts.into_iter().collect();
    list.sort_by_key(|&(ip, _)| ip);
    list
}

/// Parses a foreign-address token, stripping the port suffix.
///
/// Handles `1.2.3.4:443`, `[::1]:443`, BSD's `1.2.3.4.443` and bare
/// addresses.
fn parse_peer_addr(token: &str) -> Option<IpAddr> {
    if let Ok(ip) = token.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Some((host, _port)) = token.rsplit_once(':') {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Some(ip);
        }
    }
    if let Some((host, _port)) = token.rsplit_once('.') {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Some(ip);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_PING: &str = "\
PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.
64 bytes from 1.1.1.1: icmp_seq=1 ttl=58 time=12.4 ms

--- 1.1.1.1 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 12.417/12.417/12.417/0.000 ms
";

    const WINDOWS_PING: &str = "\
Pinging 1.1.1.1 with 32 bytes of data:
Reply from 1.1.1.1: bytes=32 time=18ms TTL=58

Ping statistics for 1.1.1.1:
    Packets: Sent = 4, Received = 3, Lost = 1 (25% loss),
";

    #[test]
    fn rtt_from_unix_output() {
        assert_eq!(parse_rtt_ms(LINUX_PING), Some(12.4));
    }

    #[test]
    fn rtt_from_windows_output() {
        assert_eq!(parse_rtt_ms(WINDOWS_PING), Some(18.0));
    }

    #[test]
    fn rtt_absent_when_no_time_field() {
        assert_eq!(parse_rtt_ms("Request timed out."), None);
        assert_eq!(parse_rtt_ms("Reply from 1.1.1.1: time<1ms"), None);
    }

    #[test]
    fn loss_from_unix_output() {
        assert_eq!(parse_loss_pct(LINUX_PING), Some(0.0));
        let lossy = "10 packets transmitted, 7 received, 30% packet loss, time 9012ms";
        assert_eq!(parse_loss_pct(lossy), Some(30.0));
        let macos = "10 packets transmitted, 9 packets received, 10.0% packet loss";
        assert_eq!(parse_loss_pct(macos), Some(10.0));
    }

    #[test]
    fn loss_from_windows_output() {
        assert_eq!(parse_loss_pct(WINDOWS_PING), Some(25.0));
    }

    #[test]
    fn loss_absent_when_no_field() {
        assert_eq!(parse_loss_pct("ping: unknown host example.invalid"), None);
    }

    #[test]
    fn connection_counts_from_linux_netstat() {
        let output = "\
Active Internet connections (w/o servers)
Proto Recv-Q Send-Q Local Address           Foreign Address         State
tcp        0      0 10.0.0.2:443            203.0.113.5:52100       ESTABLISHED
tcp        0      0 10.0.0.2:443            203.0.113.5:52101       ESTABLISHED
tcp        0      0 10.0.0.2:22             198.51.100.9:40022      ESTABLISHED
udp        0      0 10.0.0.2:53             203.0.113.5:53          ESTABLISHED
";
        let counts = parse_connection_counts(output);
        assert_eq!(
            counts,
            vec![
                ("198.51.100.9".parse().unwrap(), 1),
                ("203.0.113.5".parse().unwrap(), 3),
            ]
        );
    }

    #[test]
    fn connection_counts_skip_malformed_columns() {
        let output = "\
Proto Recv-Q Send-Q Local Address Foreign Address State
tcp 0 0 10.0.0.2:80 not-an-address ESTABLISHED
tcp 0 0 10.0.0.2:80 192.0.2.33:1234 TIME_WAIT
";
        let counts = parse_connection_counts(output);
        assert_eq!(counts, vec![("192.0.2.33".parse().unwrap(), 1)]);
    }

    #[test]
    fn peer_addr_forms() {
        assert_eq!(parse_peer_addr("1.2.3.4:443"), Some("1.2.3.4".parse().unwrap()));
        assert_eq!(parse_peer_addr("1.2.3.4.443"), Some("1.2.3.4".parse().unwrap()));
        assert_eq!(parse_peer_addr("[2001:db8::1]:443"), Some("2001:db8::1".parse().unwrap()));
        assert_eq!(parse_peer_addr("2001:db8::1"), Some("2001:db8::1".parse().unwrap()));
        assert_eq!(parse_peer_addr("*.*"), None);
    }
}
