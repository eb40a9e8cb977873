//! Built-in root server hints.
//!
//! The IANA root servers, frozen at build time. Operators who track the
//! published root hints file can pass their own RRset to the resolver
//! constructor instead.

use radix_proto::{Name, ResourceRecord};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// One root server entry.
struct RootServer {
    name: &'static str,
    ipv4: &'static str,
    ipv6: &'static str,
}

/// IANA root servers.
static ROOT_SERVERS: &[RootServer] = &[
    RootServer {
        name: "a.root-servers.net",
        ipv4: "198.41.0.4",
        ipv6: "2001:503:ba3e::2:30",
    },
    RootServer {
        name: "b.root-servers.net",
        ipv4: "199.9.14.201",
        ipv6: "2001:500:200::b",
    },
    RootServer {
        name: "c.root-servers.net",
        ipv4: "192.33.4.12",
        ipv6: "2001:500:2::c",
    },
    RootServer {
        name: "d.root-servers.net",
        ipv4: "199.7.91.13",
        ipv6: "2001:500:2d::d",
    },
    RootServer {
        name: "e.root-servers.net",
        ipv4: "192.203.230.10",
        ipv6: "2001:500:a8::e",
    },
    RootServer {
        name: "f.root-servers.net",
        ipv4: "192.5.5.241",
        ipv6: "2001:500:2f::f",
    },
    RootServer {
        name: "g.root-servers.net",
        ipv4: "192.112.36.4",
        ipv6: "2001:500:12::d0d",
    },
    RootServer {
        name: "h.root-servers.net",
        ipv4: "198.97.190.53",
        ipv6: "2001:500:1::53",
    },
    RootServer {
        name: "i.root-servers.net",
        ipv4: "192.36.148.17",
        ipv6: "2001:7fe::53",
    },
    RootServer {
        name: "j.root-servers.net",
        ipv4: "192.58.128.30",
        ipv6: "2001:503:c27::2:30",
    },
    RootServer {
        name: "k.root-servers.net",
        ipv4: "193.0.14.129",
        ipv6: "2001:7fd::1",
    },
    RootServer {
        name: "l.root-servers.net",
        ipv4: "199.7.83.42",
        ipv6: "2001:500:9f::42",
    },
    RootServer {
        name: "m.root-servers.net",
        ipv4: "202.12.27.33",
        ipv6: "2001:dc3::35",
    },
];

/// TTL stamped on the built-in hint records; the value is cosmetic
/// since hints never pass through the cache.
const HINT_TTL: u32 = 3_600_000;

/// Returns the built-in root hints as an RRset: NS records for the root
/// plus A (and, with `ipv6`, AAAA) glue.
pub fn builtin_root_hints(ipv6: bool) -> Vec<ResourceRecord> {
    let root = Name::root();
    let mut records = Vec::with_capacity(ROOT_SERVERS.len() * 3);

    for server in ROOT_SERVERS {
        let name = Name::from_str(server.name).expect("static root server name");
        records.push(ResourceRecord::ns(root.clone(), HINT_TTL, name.clone()));

        let v4 = Ipv4Addr::from_str(server.ipv4).expect("static root server ipv4");
        records.push(ResourceRecord::a(name.clone(), HINT_TTL, v4));

        if ipv6 {
            let v6 = Ipv6Addr::from_str(server.ipv6).expect("static root server ipv6");
            records.push(ResourceRecord::aaaa(name, HINT_TTL, v6));
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use radix_proto::RecordType;

    #[test]
    fn hints_cover_all_thirteen_servers() {
        let hints = builtin_root_hints(false);
        let a_count = hints
            .iter()
            .filter(|r| r.record_type() == Some(RecordType::A))
            .count();
        assert_eq!(a_count, 13);
        assert!(hints
            .iter()
            .filter(|r| r.record_type() == Some(RecordType::NS))
            .all(|r| r.name().is_root()));
    }

    #[test]
    fn ipv6_adds_aaaa_glue() {
        let hints = builtin_root_hints(true);
        let aaaa_count = hints
            .iter()
            .filter(|r| r.record_type() == Some(RecordType::AAAA))
            .count();
        assert_eq!(aaaa_count, 13);
    }
}
