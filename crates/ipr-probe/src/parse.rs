use std::net::IpAddr;

/// One row of `show ip arp`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip_address: String,
    pub age: String,
    pub mac_address: String,
    pub interface: String,
}

impl ArpEntry {
    /// An age of `-` (EOS) or `static` marks a pinned entry.
    pub fn is_static(&self) -> bool {
        self.age == "-" || self.age.eq_ignore_ascii_case("static")
    }
}

/// One row of `show ip interface brief`, addressed interfaces only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub interface: String,
    /// May carry a `/len` suffix, exactly as printed by the device.
    pub ip_address: String,
    /// Line status column, lowercased: "up", "down", or whatever the device
    /// printed.
    pub status: String,
    pub description: String,
}

/// Parse raw `show ip arp` output.
///
/// Header lines, blank lines and short rows are skipped; a row counts only
/// when its first column parses as an IP address. Expected column order is
/// the Arista EOS one:
///
/// ```text
/// Address         Age (sec)  Hardware Addr   Interface
/// 10.0.1.1        0:00:05    001a.2b3c.4d5e  Ethernet1
/// 10.0.1.10       -          001a.2b3c.4d61  Ethernet3
/// ```
pub fn parse_arp_output(raw: &str) -> Vec<ArpEntry> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 4 {
            continue;
        }
        if cols[0].parse::<IpAddr>().is_err() {
            continue;
        }
        out.push(ArpEntry {
            ip_address: cols[0].to_string(),
            age: cols[1].to_string(),
            mac_address: cols[2].to_string(),
            interface: cols[3].to_string(),
        });
    }
    out
}

/// Parse raw `show ip interface brief` output, keeping only rows with an
/// assigned address.
///
/// ```text
/// Interface       IP Address      Status  Protocol  MTU   Description
/// Ethernet1       10.0.1.1/24     up      up        1500  Uplink to spine
/// Ethernet2       unassigned      up      up        1500
/// ```
pub fn parse_interface_brief(raw: &str) -> Vec<InterfaceEntry> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 3 {
            continue;
        }
        let bare = cols[1].split('/').next().unwrap_or_default();
        if bare.parse::<IpAddr>().is_err() {
            // Header row or "unassigned".
            continue;
        }
        out.push(InterfaceEntry {
            interface: cols[0].to_string(),
            ip_address: cols[1].to_string(),
            status: cols[2].to_ascii_lowercase(),
            description: if cols.len() > 5 {
                cols[5..].join(" ")
            } else {
                String::new()
            },
        });
    }
    out
}
