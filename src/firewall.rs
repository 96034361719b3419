//! Firewall gateway: per-platform block/unblock commands behind one
//! trait.
//!
//! Commands are built as argument arrays, never concatenated strings.
//! A non-zero exit surfaces as `Err` carrying the command's stderr so
//! callers can distinguish a real failure from a successful no-op, and
//! bookkeeping stays success-gated.

use crate::monitor::sampler::Platform;
use std::net::IpAddr;
use std::process::Command;

/// Block/unblock capability for one firewall backend.
pub trait Firewall {
    /// Backend name for log lines.
    fn name(&self) -> &'static str;

    /// Inserts a drop rule for all inbound traffic from `ip`.
    fn block(&self, ip: IpAddr) -> Result<(), String>;

    /// Removes the drop rule for `ip`.
    fn unblock(&self, ip: IpAddr) -> Result<(), String>;
}

/// Selects the backend matching the detected platform.
pub fn platform_firewall(platform: Platform) -> Box<dyn Firewall> {
    match platform {
        Platform::Linux => Box::new(Iptables),
        Platform::Macos => Box::new(PacketFilter),
        Platform::Windows => Box::new(NetshAdvfirewall),
    }
}

/// Executes a command, mapping non-zero exit to `Err` with stderr text.
fn exec(cmd: &str, args: &[String]) -> Result<(), String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .map_err(|e| format!("failed to execute {}: {}", cmd, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {}: {}",
            cmd,
            output.status,
            stderr.trim()
        ));
    }

    Ok(())
}

/// Linux backend: INPUT-chain drop rules.
pub struct Iptables;

impl Iptables {
    fn rule_args(chain_op: &str, ip: IpAddr) -> Vec<String> {
        vec![
            chain_op.to_string(),
            "INPUT".to_string(),
            "-s".to_string(),
            ip.to_string(),
            "-j".to_string(),
            "DROP".to_string(),
        ]
    }
}

impl Firewall for Iptables {
    fn name(&self) -> &'static str {
        "iptables"
    }

    fn block(&self, ip: IpAddr) -> Result<(), String> {
        exec("iptables", &Self::rule_args("-A", ip))
    }

    fn unblock(&self, ip: IpAddr) -> Result<(), String> {
        exec("iptables", &Self::rule_args("-D", ip))
    }
}

/// macOS backend: a pf address table.
pub struct PacketFilter;

/// Name of the pf table holding blocked addresses.
const PF_TABLE: &str = "blocked_ips";

impl PacketFilter {
    fn table_args(verb: &str, ip: IpAddr) -> Vec<String> {
        vec![
            "-t".to_string(),
            PF_TABLE.to_string(),
            "-T".to_string(),
            verb.to_string(),
            ip.to_string(),
        ]
    }
}

impl Firewall for PacketFilter {
    fn name(&self) -> &'static str {
        "pf"
    }

    fn block(&self, ip: IpAddr) -> Result<(), String> {
        exec("pfctl", &Self::table_args("add", ip))
    }

    fn unblock(&self, ip: IpAddr) -> Result<(), String> {
        exec("pfctl", &Self::table_args("delete", ip))
    }
}

/// Windows backend: named advfirewall rules, one per blocked IP.
pub struct NetshAdvfirewall;

impl NetshAdvfirewall {
    fn rule_name(ip: IpAddr) -> String {
        format!("Block_{}", ip)
    }

    fn add_args(ip: IpAddr) -> Vec<String> {
        vec![
            "advfirewall".to_string(),
            "firewall".to_string(),
            "add".to_string(),
            "rule".to_string(),
            format!("name={}", Self::rule_name(ip)),
            "dir=in".to_string(),
            "action=block".to_string(),
            format!("remoteip={}", ip),
        ]
    }

    fn delete_args(ip: IpAddr) -> Vec<String> {
        vec![
            "advfirewall".to_string(),
            "firewall".to_string(),
            "delete".to_string(),
            "rule".to_string(),
            format!("name={}", Self::rule_name(ip)),
        ]
    }
}

impl Firewall for NetshAdvfirewall {
    fn name(&self) -> &'static str {
        "netsh"
    }

    fn block(&self, ip: IpAddr) -> Result<(), String> {
        exec("netsh", &Self::add_args(ip))
    }

    fn unblock(&self, ip: IpAddr) -> Result<(), String> {
        exec("netsh", &Self::delete_args(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn iptables_rule_args() {
        assert_eq!(
            Iptables::rule_args("-A", ip("203.0.113.5")),
            vec!["-A", "INPUT", "-s", "203.0.113.5", "-j", "DROP"]
        );
        assert_eq!(
            Iptables::rule_args("-D", ip("203.0.113.5")),
            vec!["-D", "INPUT", "-s", "203.0.113.5", "-j", "DROP"]
        );
    }

    #[test]
    fn pf_table_args() {
        assert_eq!(
            PacketFilter::table_args("add", ip("203.0.113.5")),
            vec!["-t", "blocked_ips", "-T", "add", "203.0.113.5"]
        );
    }

    #[test]
    fn netsh_rule_args() {
        assert_eq!(
            NetshAdvfirewall::add_args(ip("203.0.113.5")),
            vec![
                "advfirewall",
                "firewall",
                "add",
                "rule",
                "name=Block_203.0.113.5",
                "dir=in",
                "action=block",
                "remoteip=203.0.113.5",
            ]
        );
        assert_eq!(
            NetshAdvfirewall::delete_args(ip("203.0.113.5")),
            vec![
                "advfirewall",
                "firewall",
                "delete",
                "rule",
                "name=Block_203.0.113.5",
            ]
        );
    }
}
