//! End-to-end conformance scenarios (spec §8), exercising the public API
//! the way a consumer of the crate would: parsing whole documents and
//! mapping them to derived structs, rather than poking at individual
//! lexer/parser internals (those have their own unit tests next to the
//! code they cover).

use confetti::{parse, parse_with_options, Confetti, ParseError, ParserOptions};
use confetti::mapper::FromConf;

#[test]
fn nested_server_block_round_trips_through_comparison_format() {
    let input = r#"
server {
    host "localhost"
    port 8080

    location "/" {
        try_files "$uri" "$uri/" "=404"
    }
}
"#;
    let unit = parse(input).unwrap();
    assert_eq!(unit.directives.len(), 1);
    assert_eq!(
        unit.directives[0].to_comparison_format(),
        "<server> [<host> <localhost> <port> <8080> <location> </> [<try_files> <$uri> <$uri/> <=404>]]"
    );
}

#[test]
fn comments_are_collected_but_not_attached_to_directives() {
    let input = "# top level\nserver localhost # trailing\n";
    let unit = parse(input).unwrap();
    assert_eq!(unit.directives.len(), 1);
    assert_eq!(unit.comments.len(), 2);
}

#[test]
fn unclosed_block_is_reported_at_the_opening_brace() {
    let input = "server {\n    host localhost\n";
    let err = parse(input).unwrap_err();
    assert!(matches!(err, ParseError::UnclosedBlock { offset: 7 }));
}

#[test]
fn c_style_comments_are_rejected_unless_enabled() {
    let input = "/* hi */\nserver localhost\n";
    assert!(parse(input).is_err());

    let options = ParserOptions {
        c_style_comments: true,
        ..ParserOptions::default()
    };
    let unit = parse_with_options(input, options).unwrap();
    assert_eq!(unit.directives.len(), 1);
}

#[test]
fn list_of_string_splits_on_commas_for_a_single_occurrence() {
    #[derive(Confetti, Debug)]
    struct Tags {
        #[allow(dead_code)]
        name: String,
        tags: Vec<String>,
    }

    let config = "tags {\n    name \"demo\"\n    tags \"a, b, c\"\n}\n";
    let parsed = Tags::from_str(config).unwrap();
    assert_eq!(parsed.tags, vec!["a", "b", "c"]);
}

#[test]
fn list_of_string_treats_repeated_occurrences_as_elements_not_commas() {
    #[derive(Confetti, Debug)]
    struct Tags {
        #[allow(dead_code)]
        name: String,
        tags: Vec<String>,
    }

    let config = "tags {\n    name \"demo\"\n    tags \"a, b\"\n    tags \"c\"\n}\n";
    let parsed = Tags::from_str(config).unwrap();
    assert_eq!(parsed.tags, vec!["a, b", "c"]);
}

#[test]
fn nested_struct_field_maps_recursively() {
    #[derive(Confetti, Debug)]
    struct Ssl {
        enabled: bool,
        cert: String,
    }

    #[derive(Confetti, Debug)]
    struct Server {
        host: String,
        port: i64,
        ssl: Ssl,
    }

    let config = r#"
server {
    host "localhost"
    port 8443
    ssl {
        enabled true
        cert "/path/to/cert.pem"
    }
}
"#;
    let server = Server::from_str(config).unwrap();
    assert_eq!(server.host, "localhost");
    assert_eq!(server.port, 8443);
    assert!(server.ssl.enabled);
    assert_eq!(server.ssl.cert, "/path/to/cert.pem");
}

#[test]
fn absent_defaulted_scalar_field_takes_its_declared_default() {
    #[derive(Confetti, Debug)]
    struct Server {
        host: String,
        #[conf(default = "8080")]
        port: i64,
    }

    let config = "server {\n    host \"localhost\"\n}\n";
    let server = Server::from_str(config).unwrap();
    assert_eq!(server.host, "localhost");
    assert_eq!(server.port, 8080);

    let explicit = "server {\n    host \"localhost\"\n    port 9090\n}\n";
    let server = Server::from_str(explicit).unwrap();
    assert_eq!(server.port, 9090);
}

#[test]
fn unknown_field_is_rejected_at_the_mapper_layer() {
    #[derive(Confetti, Debug)]
    struct Minimal {
        host: String,
    }

    let config = "minimal {\n    host \"localhost\"\n    bogus 1\n}\n";
    assert!(Minimal::from_str(config).is_err());
}
