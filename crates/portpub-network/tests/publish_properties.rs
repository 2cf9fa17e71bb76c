//! Integration tests for port publishing.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;

use portpub_common::{PortpubError, PortpubResult, PublishConfig};
use portpub_network::{
    PortMapping, PortMappingRequest, PortPublisher, PortSource, Protocol, PublishRequest,
    parse_host_ip, parse_port_mappings,
};
use proptest::prelude::*;

/// Hands out consecutive ports starting at `next`.
struct CountingSource {
    next: u16,
    calls: u32,
}

impl PortSource for CountingSource {
    fn probe(&mut self) -> PortpubResult<u16> {
        self.calls += 1;
        let port = self.next;
        self.next = self.next.wrapping_add(1);
        Ok(port)
    }
}

/// Always hands out the same port.
struct StuckSource {
    port: u16,
    calls: u32,
}

impl PortSource for StuckSource {
    fn probe(&mut self) -> PortpubResult<u16> {
        self.calls += 1;
        Ok(self.port)
    }
}

fn bind_ip(mapping: &PortMapping) -> IpAddr {
    parse_host_ip(&mapping.host_ip).unwrap()
}

fn assert_unique(mappings: &[PortMapping]) {
    let mut host_keys = HashSet::new();
    let mut container_keys = HashSet::new();
    for mapping in mappings {
        let ip = bind_ip(mapping);
        assert!(
            host_keys.insert((mapping.protocol, ip, mapping.host_port)),
            "host port reused: {mapping:?}"
        );
        assert!(
            container_keys.insert((mapping.protocol, ip, mapping.container_port)),
            "container port reused: {mapping:?}"
        );
    }
}

#[test_log::test]
fn explicit_and_exposed_ports_combine() {
    let request = PublishRequest {
        port_mappings: vec![
            PortMappingRequest::new(8000)
                .with_host_port(9000)
                .with_range(3),
            PortMappingRequest::new(53).with_protocol("udp,sctp"),
        ],
        expose: BTreeMap::from([(9090, "udp".to_string())]),
        image_exposed_ports: Some(["8000/tcp", "9090/tcp"].map(String::from).into()),
        publish_exposed_ports: true,
    };
    let source = CountingSource {
        next: 40000,
        calls: 0,
    };
    let mut publisher = PortPublisher::with_source(PublishConfig::default(), source);

    let mappings = publisher.publish(&request).unwrap();

    assert_eq!(
        mappings,
        vec![
            PortMapping::tcp(9000, 8000),
            PortMapping::tcp(9001, 8001),
            PortMapping::tcp(9002, 8002),
            PortMapping::udp(53, 53),
            PortMapping {
                host_port: 53,
                container_port: 53,
                protocol: Protocol::Sctp,
                host_ip: String::new(),
            },
            PortMapping::tcp(40000, 9090),
            PortMapping::udp(40001, 9090),
        ]
    );
    assert_unique(&mappings);
}

#[test]
fn image_sctp_is_refused_but_explicit_sctp_is_not() {
    let mut publisher = PortPublisher::with_source(
        PublishConfig::default(),
        CountingSource {
            next: 40000,
            calls: 0,
        },
    );

    let exposed = PublishRequest {
        image_exposed_ports: Some(["53/sctp".to_string()].into()),
        publish_exposed_ports: true,
        ..PublishRequest::default()
    };
    assert!(matches!(
        publisher.publish(&exposed),
        Err(PortpubError::ProtocolNotAllowed { .. })
    ));

    let explicit = PublishRequest {
        port_mappings: vec![PortMappingRequest::new(53).with_protocol("sctp")],
        ..PublishRequest::default()
    };
    let mappings = publisher.publish(&explicit).unwrap();
    assert_eq!(mappings[0].protocol, Protocol::Sctp);
}

#[test]
fn exhaustion_stops_after_fifteen_probes() {
    let request = PublishRequest {
        port_mappings: vec![PortMappingRequest::new(80).with_host_port(8080)],
        expose: BTreeMap::from([(443, "tcp".to_string())]),
        publish_exposed_ports: true,
        ..PublishRequest::default()
    };
    let mut publisher = PortPublisher::with_source(
        PublishConfig::default(),
        StuckSource {
            port: 8080,
            calls: 0,
        },
    );

    let err = publisher.publish(&request).unwrap_err();
    match err {
        PortpubError::PortAllocationExhausted {
            container_port,
            protocol,
            attempts,
        } => {
            assert_eq!(container_port, 443);
            assert_eq!(protocol, "tcp");
            assert_eq!(attempts, 15);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(publisher.source().calls, 15);
}

#[test]
fn merge_is_a_union_of_protocols() {
    let request = PublishRequest {
        expose: BTreeMap::from([(5000, "udp".to_string())]),
        image_exposed_ports: Some(["5000/tcp".to_string()].into()),
        publish_exposed_ports: true,
        ..PublishRequest::default()
    };
    let mut publisher = PortPublisher::with_source(
        PublishConfig::default(),
        CountingSource {
            next: 41000,
            calls: 0,
        },
    );

    let protocols: Vec<Protocol> = publisher
        .publish(&request)
        .unwrap()
        .into_iter()
        .map(|m| m.protocol)
        .collect();
    assert_eq!(protocols, vec![Protocol::Tcp, Protocol::Udp]);
}

#[test]
fn os_source_publishes_real_ports() {
    let request = PublishRequest {
        image_exposed_ports: Some(["80".to_string(), "443".to_string()].into()),
        publish_exposed_ports: true,
        ..PublishRequest::default()
    };

    let mappings =
        portpub_network::compute_mappings(&request, &PublishConfig::default()).unwrap();

    assert_eq!(mappings.len(), 2);
    assert!(mappings.iter().all(|m| m.host_port != 0 && m.host_ip.is_empty()));
    assert_unique(&mappings);
}

fn request_strategy() -> impl Strategy<Value = PortMappingRequest> {
    (
        1u16..40,
        prop_oneof![Just(0u16), 1u16..40],
        prop_oneof![Just(""), Just("0.0.0.0"), Just("127.0.0.1"), Just("::1")],
        prop_oneof![Just(""), Just("tcp"), Just("udp"), Just("tcp,udp")],
        0u16..4,
    )
        .prop_map(|(container_port, host_port, host_ip, protocol, range)| {
            PortMappingRequest::new(container_port)
                .with_host_port(host_port)
                .with_host_ip(host_ip)
                .with_protocol(protocol)
                .with_range(range)
        })
}

proptest! {
    #[test]
    fn accepted_mappings_never_share_ports(
        requests in prop::collection::vec(request_strategy(), 0..8)
    ) {
        if let Ok(validated) = parse_port_mappings(&requests, &PublishConfig::default()) {
            assert_unique(&validated.mappings);
            prop_assert!(validated.claims.is_mirrored());
            prop_assert_eq!(
                validated.claims.container_to_host().iter().count(),
                validated.mappings.len()
            );
        }
    }

    #[test]
    fn published_tables_never_share_ports(
        requests in prop::collection::vec(request_strategy(), 0..6),
        exposed in prop::collection::btree_set(1u16..60, 0..6),
        first_probe in 1u16..60,
    ) {
        let request = PublishRequest {
            port_mappings: requests,
            image_exposed_ports: Some(exposed.iter().map(u16::to_string).collect()),
            publish_exposed_ports: true,
            ..PublishRequest::default()
        };
        let source = CountingSource { next: first_probe, calls: 0 };
        let mut publisher = PortPublisher::with_source(PublishConfig::default(), source);

        match publisher.publish(&request) {
            Ok(mappings) => assert_unique(&mappings),
            Err(err) => {
                let source_failed = matches!(err, PortpubError::PortProbeFailed { .. });
                prop_assert!(!source_failed, "port source failed: {}", err);
            }
        }
    }

    #[test]
    fn validation_is_deterministic(
        requests in prop::collection::vec(request_strategy(), 0..8)
    ) {
        let config = PublishConfig::default();
        let first = parse_port_mappings(&requests, &config).map(|v| v.mappings).ok();
        let second = parse_port_mappings(&requests, &config).map(|v| v.mappings).ok();
        prop_assert_eq!(first, second);
    }
}
