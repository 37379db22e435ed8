use airscan_xml::parser::MAX_DEPTH;
use airscan_xml::{ErrorKind, XmlNs, XmlReader};

const ESCL_NS_RULES: &[XmlNs<'static>] = &[
    XmlNs::new("scan", "http*://schemas.hp.com/imaging/escl/2011/05/03"),
    XmlNs::new("pwg", "http*://www.pwg.org/schemas/2010/12/sm"),
    XmlNs::END,
];

const CAPABILITIES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<scan:ScannerCapabilities xmlns:pwg="http://www.pwg.org/schemas/2010/12/sm"
                          xmlns:scan="http://schemas.hp.com/imaging/escl/2011/05/03">
  <pwg:Version>2.63</pwg:Version>
  <pwg:MakeAndModel>Example MFP</pwg:MakeAndModel>
  <scan:Platen>
    <scan:PlatenInputCaps>
      <scan:MinWidth>16</scan:MinWidth>
      <scan:MaxWidth>2550</scan:MaxWidth>
      <scan:MinHeight>16</scan:MinHeight>
      <scan:MaxHeight>3508</scan:MaxHeight>
    </scan:PlatenInputCaps>
  </scan:Platen>
</scan:ScannerCapabilities>
"#;

fn collect_paths(reader: &mut XmlReader<'_>) -> Vec<String> {
    let mut paths = Vec::new();
    while !reader.end() {
        paths.push(reader.path().unwrap().to_string());
        reader.deep_next(0);
    }
    paths
}

#[test]
fn test_prefixes_are_normalized() {
    let xml = br#"<x:ScannerStatus xmlns:x="https://schemas.hp.com/imaging/escl/2011/05/03">
      <y:Version xmlns:y="http://www.pwg.org/schemas/2010/12/sm">2.0</y:Version>
      <x:State>Processing</x:State>
    </x:ScannerStatus>"#;

    let mut reader = XmlReader::begin(xml, Some(ESCL_NS_RULES)).unwrap();
    assert_eq!(
        collect_paths(&mut reader),
        vec![
            "scan:ScannerStatus",
            "scan:ScannerStatus/pwg:Version",
            "scan:ScannerStatus/scan:State",
        ]
    );
}

#[test]
fn test_same_uri_gets_same_prefix() {
    let xml = br#"<a:Root xmlns:a="http://www.pwg.org/schemas/2010/12/sm">
      <b:Item xmlns:b="http://www.pwg.org/schemas/2010/12/sm"/>
      <Item xmlns="http://www.pwg.org/schemas/2010/12/sm"/>
      <a:Item/>
    </a:Root>"#;

    let mut reader = XmlReader::begin(xml, Some(ESCL_NS_RULES)).unwrap();
    reader.enter();
    let mut names = Vec::new();
    while !reader.end() {
        names.push(reader.name().unwrap().to_string());
        reader.next();
    }
    assert_eq!(names, vec!["pwg:Item", "pwg:Item", "pwg:Item"]);
}

#[test]
fn test_path_is_joined_names() {
    let mut reader = XmlReader::begin(CAPABILITIES, Some(ESCL_NS_RULES)).unwrap();
    let mut stack: Vec<String> = Vec::new();

    while !reader.end() {
        stack.truncate(reader.depth());
        stack.push(reader.name().unwrap().to_string());
        assert_eq!(reader.path().unwrap(), stack.join("/"));
        reader.deep_next(0);
    }
    assert_eq!(stack.len(), 4);
}

#[test]
fn test_capabilities_values() {
    let mut reader = XmlReader::begin(CAPABILITIES, Some(ESCL_NS_RULES)).unwrap();
    let mut version = None;
    let mut widths = Vec::new();

    while !reader.end() {
        match reader.path().unwrap() {
            "scan:ScannerCapabilities/pwg:Version" => {
                version = reader.value().map(str::to_string);
            }
            "scan:ScannerCapabilities/scan:Platen/scan:PlatenInputCaps/scan:MinWidth"
            | "scan:ScannerCapabilities/scan:Platen/scan:PlatenInputCaps/scan:MaxWidth" => {
                widths.push(reader.value_uint().unwrap());
            }
            _ => {}
        }
        reader.deep_next(0);
    }

    assert_eq!(version.as_deref(), Some("2.63"));
    assert_eq!(widths, vec![16, 2550]);
}

#[test]
fn test_bad_number_is_reported_with_name() {
    let xml = br#"<scan:Job xmlns:scan="http://schemas.hp.com/imaging/escl/2011/05/03"><scan:Age>soon</scan:Age></scan:Job>"#;
    let mut reader = XmlReader::begin(xml, Some(ESCL_NS_RULES)).unwrap();
    reader.enter();

    let err = reader.value_uint().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedValue);
    assert_eq!(err.to_string(), "scan:Age: invalid numerical value \"soon\"");
}

#[test]
fn test_latin1_document() {
    let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
        <scan:ScannerCapabilities xmlns:scan=\"http://schemas.hp.com/imaging/escl/2011/05/03\">\
        <scan:MakeAndModel>Soci\xe9t\xe9 G\xe9n\xe9rale MFP</scan:MakeAndModel>\
        </scan:ScannerCapabilities>";

    let mut reader = XmlReader::begin(xml, Some(ESCL_NS_RULES)).unwrap();
    reader.enter();
    assert_eq!(reader.path(), Some("scan:ScannerCapabilities/scan:MakeAndModel"));
    assert_eq!(reader.value(), Some("Soci\u{e9}t\u{e9} G\u{e9}n\u{e9}rale MFP"));
}

#[test]
fn test_nesting_limit() {
    let nested = |depth: usize| format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth));

    let xml = nested(MAX_DEPTH);
    let mut reader = XmlReader::begin(xml.as_bytes(), None).unwrap();
    assert_eq!(reader.value(), Some("x"));
    let mut deepest: usize = 0;
    let mut visited = 0;
    while !reader.end() {
        deepest = deepest.max(reader.depth());
        visited += 1;
        reader.deep_next(0);
    }
    assert_eq!(visited, MAX_DEPTH);
    assert_eq!(deepest, MAX_DEPTH - 1);

    for depth in [MAX_DEPTH + 1, 200_000] {
        let err = XmlReader::begin(nested(depth).as_bytes(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }
}

#[test]
fn test_malformed_documents() {
    let docs: [&[u8]; 6] = [b"", b"<a>", b"<a><b></a>", b"<a/><b/>", b"text", b"<a x=1/>"];
    for xml in docs {
        let err = XmlReader::begin(xml, None).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::MalformedInput,
            "{:?}: {}",
            String::from_utf8_lossy(xml),
            err
        );
    }
}
