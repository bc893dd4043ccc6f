use pagecopy::extract_links;

fn extract(html: &str, base: &str) -> Vec<pagecopy::LinkRecord> {
    match extract_links(html, base) {
        Ok(links) => links,
        Err(err) => panic!("expected Ok(_), got Err({err:?})"),
    }
}

#[test]
fn extract_returns_one_record_per_anchor_with_href_in_document_order() {
    let html = r#"
        <html><body>
            <nav><a href="/1">one</a></nav>
            <a name="anchor-without-href">skipped</a>
            <main>
                <p><a href="/2">two</a> and <a href="/3">three</a></p>
                <div hidden><a href="/4">hidden but counted</a></div>
            </main>
            <footer><a href="/5">five</a></footer>
        </body></html>
    "#;

    let links = extract(html, "https://x.com/");
    let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://x.com/1",
            "https://x.com/2",
            "https://x.com/3",
            "https://x.com/4",
            "https://x.com/5",
        ]
    );
}

#[test]
fn extraction_is_deterministic_across_runs() {
    let html = r#"
        <ul>
            <li><a href="a">A</a></li>
            <li><a href="a">A again</a></li>
            <li><a href="b?q=1#frag">B</a></li>
        </ul>
    "#;

    let first = extract(html, "https://x.com/dir/");
    let second = extract(html, "https://x.com/dir/");
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn relative_references_resolve_against_the_base() {
    let html = r#"<a href="../x?y=1">up</a>"#;
    let links = extract(html, "https://a.com/dir/page");
    assert_eq!(links[0].url, "https://a.com/x?y=1");
}

#[test]
fn scheme_relative_and_fragment_references_resolve() {
    let html = r##"<a href="//b.com/z">scheme-rel</a><a href="#top">frag</a>"##;
    let links = extract(html, "https://a.com/dir/page");

    assert_eq!(links[0].url, "https://b.com/z");
    assert!(links[0].is_external);
    assert_eq!(links[1].url, "https://a.com/dir/page#top");
    assert!(!links[1].is_external);
}

#[test]
fn cross_origin_http_links_are_external_same_origin_are_not() {
    let html = r#"<a href="https://b.com/z">out</a><a href="/local">in</a>"#;
    let links = extract(html, "https://a.com");

    assert!(links[0].is_external);
    assert!(!links[1].is_external);
}

#[test]
fn non_http_schemes_are_never_external() {
    let html = r#"<a href="mailto:x@b.com">mail</a><a href="javascript:void(0)">js</a>"#;
    let links = extract(html, "https://a.com");

    assert!(!links[0].is_external);
    assert!(!links[1].is_external);
}

#[test]
fn long_anchor_text_is_truncated_to_exactly_100_chars() {
    let text = "abcdefghij".repeat(20); // 200 chars
    let html = format!(r#"<a href="/l">{text}</a>"#);
    let links = extract(&html, "https://x.com/");

    assert_eq!(links[0].text.chars().count(), 100);
    assert_eq!(links[0].text, text.chars().take(100).collect::<String>());
}

#[test]
fn whitespace_only_anchor_text_becomes_the_placeholder() {
    let html = "<a href=\"/e\"> \n\t </a>";
    let links = extract(html, "https://x.com/");
    assert_eq!(links[0].text, "[no text]");
}

#[test]
fn extraction_scenario_matches_expected_inventory() {
    let html = r#"<a href="/a" title="T">Hi</a><a href="b">There</a>"#;
    let links = extract(html, "https://x.com/dir/");

    assert_eq!(links.len(), 2);

    assert_eq!(links[0].url, "https://x.com/a");
    assert_eq!(links[0].text, "Hi");
    assert_eq!(links[0].title, "T");
    assert!(!links[0].is_external);

    assert_eq!(links[1].url, "https://x.com/dir/b");
    assert_eq!(links[1].text, "There");
    assert_eq!(links[1].title, "");
    assert!(!links[1].is_external);
}

#[test]
fn malformed_markup_never_fails_extraction() {
    let cases = [
        "",
        "just text, no markup",
        "<a href='/unclosed'>text",
        "<html><body><a href=/noquotes>x</a>",
        "</div></div><a href='/stray'>after stray closers</a>",
        "<a href='/a'><a href='/b'>nested anchors</a></a>",
    ];

    for html in cases {
        assert!(
            extract_links(html, "https://x.com/").is_ok(),
            "extraction failed for {html:?}"
        );
    }
}

#[test]
fn unparseable_base_url_is_the_only_extraction_error() {
    assert!(extract_links("<a href='/x'>x</a>", "%%not-a-url").is_err());
    assert!(extract_links("<a href='/x'>x</a>", "ftp://a.com").is_err());
}
