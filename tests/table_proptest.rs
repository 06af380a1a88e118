use port_owner::port::encode_field;
use port_owner::table::{grammar, parse, parse_with, ParseOptions, Separators};
use port_owner::TableVariant;
use proptest::prelude::*;

/// Builds a row in the exact shape the strict grammar expects.
fn encode_row(variant: TableVariant, address: &str, port: u16, credential: u32) -> String {
    let width = variant.address_width();
    let separator = match variant {
        TableVariant::Ipv4 => "  ",
        TableVariant::Ipv6 => " ",
    };
    format!(
        "   0: {address}:{port} {remote}:0000 0A 00000000:00000000 00:00000000 00000000{separator}{credential}        0 4242 1 0000000000000000 100 0 0 10 0\n",
        port = encode_field(port),
        remote = "0".repeat(width),
    )
}

/// Builds a row the way the kernel prints it (`%5u` uid column).
fn kernel_row(variant: TableVariant, address: &str, port: u16, credential: u32) -> String {
    let remote = "0".repeat(variant.address_width());
    format!(
        "   0: {address}:{:04X} {remote}:0000 0A 00000000:00000000 00:00000000 00000000 {credential:>5}        0 4242 1 0000000000000000 100 0 0 10 0\n",
        port
    )
}

fn address_strategy(variant: TableVariant) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[0-9A-F]{{{}}}", variant.address_width()))
        .expect("valid address regex")
}

proptest! {
    #[test]
    fn ipv6_row_matches_its_hex_port(
        address in address_strategy(TableVariant::Ipv6),
        port in any::<u16>(),
        credential in any::<u32>(),
    ) {
        let row = encode_row(TableVariant::Ipv6, &address, port, credential);
        let records: Vec<_> = parse(&row, TableVariant::Ipv6).collect();

        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(records[0].local_port, port);
        prop_assert_eq!(records[0].owner_credential, credential);
        prop_assert_eq!(&records[0].local_address, &address);
    }

    #[test]
    fn ipv4_port_round_trips(
        address in address_strategy(TableVariant::Ipv4),
        port in any::<u16>(),
        credential in any::<u32>(),
    ) {
        let row = encode_row(TableVariant::Ipv4, &address, port, credential);
        let records: Vec<_> = parse(&row, TableVariant::Ipv4).collect();

        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(records[0].local_port, port);
        prop_assert_eq!(records[0].owner_credential, credential);
    }

    #[test]
    fn hex_case_does_not_matter(
        address in address_strategy(TableVariant::Ipv4),
        port in any::<u16>(),
    ) {
        let row = encode_row(TableVariant::Ipv4, &address, port, 1000).to_lowercase();
        let ports: Vec<u16> = parse(&row, TableVariant::Ipv4).map(|r| r.local_port).collect();
        prop_assert_eq!(ports, vec![port]);
    }

    #[test]
    fn relaxed_accepts_kernel_padding(
        port in any::<u16>(),
        credential in any::<u32>(),
        ipv6 in any::<bool>(),
    ) {
        let variant = if ipv6 { TableVariant::Ipv6 } else { TableVariant::Ipv4 };
        let address = "0".repeat(variant.address_width());
        let row = kernel_row(variant, &address, port, credential);
        let options = ParseOptions { separators: Separators::Relaxed, ..ParseOptions::default() };

        let records: Vec<_> = parse_with(&row, variant, &options).collect();
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(records[0].owner_credential, credential);
    }

    #[test]
    fn never_more_records_than_grammar_matches(text in "[0-9A-Fa-f: \n]{0,400}", ipv6 in any::<bool>()) {
        let variant = if ipv6 { TableVariant::Ipv6 } else { TableVariant::Ipv4 };
        let matches = grammar(variant, Separators::Strict).find_iter(&text).count();
        prop_assert!(parse(&text, variant).count() <= matches);
    }

    #[test]
    fn rows_survive_concatenation(
        ports in proptest::collection::vec(any::<u16>(), 1..8),
    ) {
        let blob: String = ports
            .iter()
            .map(|&p| encode_row(TableVariant::Ipv4, "0100007F", p, 1000).trim_end().to_string())
            .collect();
        let parsed: Vec<u16> = parse(&blob, TableVariant::Ipv4).map(|r| r.local_port).collect();
        prop_assert_eq!(parsed, ports);
    }
}
