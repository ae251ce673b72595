use compliance_api::{is_safe_url, is_valid_file_url, FileUrlPolicy};
use rstest::rstest;

// ===== SSRF Validation Tests =====

#[rstest]
#[case("https://example.com/doc")]
#[case("http://example.com")]
#[case("https://docs.example.com:8443/certificates/coi.pdf?version=2")]
#[case("https://8.8.8.8/lookup")]
#[case("https://172.32.0.1/")]
#[case("https://localhostexample.com/")]
#[case("https://my-local.example.com/")]
#[case("https://[2001:db8::1]/")]
fn test_safe_urls(#[case] url: &str) {
    assert!(is_safe_url(url), "expected {} to be safe", url);
}

#[rstest]
#[case::localhost("http://localhost/x")]
#[case::localhost_port("http://localhost:8080/admin")]
#[case::localhost_subdomain("http://api.localhost/")]
#[case::loopback("http://127.0.0.1/")]
#[case::loopback_block("http://127.8.9.10/")]
#[case::loopback_v6("http://[::1]/")]
#[case::ten("https://10.1.2.3/x")]
#[case::one_seventy_two_low("https://172.16.0.1/")]
#[case::one_seventy_two_high("https://172.31.255.255/")]
#[case::one_ninety_two("https://192.168.0.10/router")]
#[case::link_local("http://169.254.169.254/latest/meta-data/")]
#[case::unspecified("http://0.0.0.0/")]
#[case::unique_local_v6("http://[fd00:ec2::254]/latest/meta-data/")]
#[case::link_local_v6("http://[fe80::a9fe:a9fe]/")]
#[case::dot_local("https://internal.local/x")]
#[case::dot_internal("https://metadata.google.internal/")]
#[case::dot_lan("https://nas.lan/")]
#[case::dot_intranet("https://wiki.corp.intranet/")]
#[case::ftp("ftp://example.com")]
#[case::file("file:///etc/passwd")]
#[case::javascript("javascript:alert(1)")]
#[case::relative("/relative/path")]
#[case::garbage("not a url")]
fn test_unsafe_urls(#[case] url: &str) {
    assert!(!is_safe_url(url), "expected {} to be rejected", url);
}

#[test]
fn test_numeric_host_encodings_are_normalized() {
    // WHATWG parsing turns these into 127.0.0.1 and 10.0.0.1
    assert!(!is_safe_url("http://2130706433/"));
    assert!(!is_safe_url("http://0x7f.0.0.1/"));
    assert!(!is_safe_url("http://10.1/"));
}

// ===== Document Reference Tests =====

#[rstest]
#[case("")]
#[case("https://bucket.s3.amazonaws.com/anything")]
#[case("https://s3.amazonaws.com/bucket/key")]
#[case("https://random.example.com/report.pdf")]
#[case("https://random.example.com/scans/ID.JPEG")]
#[case("http://random.example.com/forms/w9.docx?sig=abc")]
#[case("https://account.blob.core.windows.net/container/blob")]
#[case("https://storage.googleapis.com/bucket/object")]
#[case("https://d111111abcdef8.cloudfront.net/key")]
fn test_valid_file_urls(#[case] url: &str) {
    assert!(is_valid_file_url(url), "expected {} to be accepted", url);
}

#[rstest]
#[case("https://random.example.com/report")]
#[case("https://random.example.com/report.pdf.exe")]
#[case("https://evil-s3.amazonaws.com.attacker.net/file")]
#[case("https://nots3.amazonaws.com/file")]
#[case("ftp://bucket.s3.amazonaws.com/report.pdf")]
#[case("report.pdf")]
fn test_invalid_file_urls(#[case] url: &str) {
    assert!(!is_valid_file_url(url), "expected {} to be rejected", url);
}

#[test]
fn test_file_url_is_more_permissive_than_fetch_rule() {
    // Stored references are never fetched by the server
    let url = "http://192.168.1.20/scan.pdf";
    assert!(is_valid_file_url(url));
    assert!(!is_safe_url(url));
}

#[test]
fn test_policy_with_no_trusted_domains() {
    let policy = FileUrlPolicy {
        trusted_domains: vec![],
        ..FileUrlPolicy::default()
    };

    assert!(!policy.is_valid("https://bucket.s3.amazonaws.com/anything"));
    assert!(policy.is_valid("https://bucket.s3.amazonaws.com/anything.png"));
}
