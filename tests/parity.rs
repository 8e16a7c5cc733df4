use std::path::PathBuf;

use dotload::{EnvMap, Error, ParseErrorKind, read_file};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> EnvMap {
    read_file(fixture(name)).unwrap_or_else(|err| panic!("{name} should parse: {err}"))
}

fn assert_values(map: &EnvMap, expected: &[(&str, &str)]) {
    for (key, value) in expected {
        assert_eq!(
            map.get(*key).map(String::as_str),
            Some(*value),
            "value for {key}"
        );
    }
}

#[test]
fn reads_plain_fixture_exactly() {
    let map = read_fixture("plain.env");
    let expected = [
        ("OPTION_A", "1"),
        ("OPTION_B", "2"),
        ("OPTION_C", "3"),
        ("OPTION_D", "4"),
        ("OPTION_E", "5"),
        ("OPTION_F", ""),
        ("OPTION_G", ""),
    ];

    assert_eq!(map.len(), expected.len());
    assert_values(&map, &expected);
}

#[test]
fn reads_quoted_fixture() {
    let map = read_fixture("quoted.env");
    assert_values(
        &map,
        &[
            ("OPTION_A", "1"),
            ("OPTION_B", "2"),
            ("OPTION_C", ""),
            ("OPTION_D", "\n"),
            ("OPTION_E", "1"),
            ("OPTION_F", "2"),
            ("OPTION_G", ""),
            ("OPTION_H", "\n"),
        ],
    );
}

#[test]
fn reads_value_with_equals_signs() {
    let map = read_fixture("equals.env");
    assert_values(
        &map,
        &[(
            "OPTION_A",
            "postgres://localhost:5432/database?sslmode=disable",
        )],
    );
}

#[test]
fn reads_bench_fixture() {
    let map = read_fixture("bench.env");
    assert_values(
        &map,
        &[
            ("A", "1"),
            ("B", "2"),
            ("C", "3"),
            ("D", "4"),
            ("E", "5"),
            ("F", "SOMETHING"),
            ("G", "something 'else'"),
            ("H", "SOMETHING else #2"),
            ("I", "something escaped\""),
            ("J", "asdfa"),
            ("K", "http"),
            ("L", "http://"),
            ("M", "http://github.com"),
            ("N", "http://github.com/alexsasharegan"),
            ("O", "http://github.com/alexsasharegan/dotenv"),
            ("P", "124215"),
            ("Q", "127.0.0.1"),
            ("R", ";aklsdgj"),
            ("S", "adsg;hkjl"),
            ("T", "k;lajdsg"),
            ("U", "\n"),
            ("V", "\n"),
            ("X", "\r"),
            ("Y", "\r\n"),
            ("Z", "\""),
        ],
    );
}

#[test]
fn reads_example_fixture_with_comments_and_interpolation() {
    let map = read_fixture("example.env");
    let expected = [
        ("S3_BUCKET", "YOURS3BUCKET"),
        ("SECRET_KEY", "YOURSECRETKEYGOESHERE"),
        ("MESSAGE", "A message containing spaces"),
        ("BASE_URL", "https://example.com"),
        ("API_URL", "https://example.com/api"),
    ];

    assert_eq!(map.len(), expected.len());
    assert_values(&map, &expected);
}

#[test]
fn interpolation_only_sees_earlier_lines() {
    let map = read_fixture("interpolated.env");
    assert_values(
        &map,
        &[
            ("DATABASE_URL", "postgres://localhost:5432/app"),
            ("MISSING", "x"),
            ("LATER", ""),
            ("DEFINED_LATER", "now"),
        ],
    );
}

#[test]
fn invalid_fixture_fails_without_partial_result() {
    let err = read_file(fixture("invalid1.env")).expect_err("expected parse error");
    match err {
        Error::Parse { path, source } => {
            assert_eq!(path, Some(fixture("invalid1.env")));
            assert_eq!(source.line, 1);
            assert_eq!(source.kind, ParseErrorKind::InvalidSyntax);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn reading_a_directory_fails_with_io_error() {
    let err = read_file(fixture("")).expect_err("expected I/O error");
    match err {
        Error::Io { path, .. } => assert!(path.is_some()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn repeated_reads_are_identical() {
    assert_eq!(read_fixture("bench.env"), read_fixture("bench.env"));
}
