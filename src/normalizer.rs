use crate::lists::ReferenceLists;
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::{Host, Url};

/// Canonical, decoded view of one submitted email.
///
/// Everything downstream (extractors, aggregator) reads this and only this.
/// Construction is total: malformed input degrades to empty headers or an
/// unchanged body, never an error.
#[derive(Debug, Clone, Default)]
pub struct NormalizedEmail {
    /// Lowercased header name -> values in original order, unfolded and
    /// RFC 2047 decoded.
    pub headers: HashMap<String, Vec<String>>,
    /// Decoded, de-HTML'd, whitespace-collapsed body.
    pub body_text: String,
    /// Unique URLs in first-occurrence order.
    pub urls: Vec<ExtractedUrl>,
    /// Visible-text / target pairs from `<a>` tags.
    pub anchors: Vec<Anchor>,
    pub sender: Option<ParsedAddress>,
    pub reply_to: Option<ParsedAddress>,
    pub display_name: Option<String>,
    /// Filenames announced in part headers (Content-Disposition / Content-Type).
    pub attachment_names: Vec<String>,
}

impl NormalizedEmail {
    pub fn header_first(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedUrl {
    pub raw: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub is_shortened: bool,
    pub has_ip_host: bool,
    /// Unicode form of an `xn--` host, for look-alike inspection.
    pub punycode_host: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ParsedAddress {
    pub display_name: Option<String>,
    pub local_part: String,
    pub domain: String,
}

/// Zero-width and BIDI-control characters dropped during folding.
const INVISIBLE_CHARS: [char; 10] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}', '\u{202D}', '\u{202E}', '\u{2066}',
    '\u{2067}', '\u{2068}', '\u{2069}',
];

/// Fold common confusable characters to their ASCII look-alikes and drop
/// invisible characters. Used on domains and display names before any
/// look-alike comparison.
pub fn fold_confusables(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if INVISIBLE_CHARS.contains(&ch) {
            continue;
        }
        out.push(match ch {
            // Cyrillic
            'а' => 'a',
            'е' => 'e',
            'о' => 'o',
            'р' => 'p',
            'с' => 'c',
            'х' => 'x',
            'і' => 'i',
            'ѕ' => 's',
            // Greek
            'α' => 'a',
            'ο' => 'o',
            'ν' => 'v',
            // Digit substitutions seen in look-alike domains
            '0' => 'o',
            '1' => 'l',
            other => other,
        });
    }
    out
}

/// Permissive RFC 5322-ish address parsing into (display name, local, domain).
pub fn parse_address(value: &str) -> Option<ParsedAddress> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (display_name, addr_part) = match value.find('<') {
        Some(lt) => {
            let gt = value[lt..].find('>').map(|i| lt + i).unwrap_or(value.len());
            let display = value[..lt].trim().trim_matches('"').trim();
            let display = (!display.is_empty()).then(|| display.to_string());
            (display, value[lt + 1..gt].trim())
        }
        None => (None, value),
    };

    let at = addr_part.rfind('@')?;
    let local_part = addr_part[..at].trim().trim_matches('"').to_string();
    let domain = addr_part[at + 1..]
        .trim()
        .trim_end_matches('>')
        .trim_matches(|c: char| c == '"' || c == '\'' || c == ';' || c == ',')
        .to_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return None;
    }

    Some(ParsedAddress {
        display_name,
        local_part,
        domain,
    })
}

pub struct Normalizer {
    lists: Arc<ReferenceLists>,
    url_regex: Regex,
    anchor_regex: Regex,
    tag_regex: Regex,
    style_script_regex: Regex,
    entity_regex: Regex,
    encoded_word_regex: Regex,
    attachment_regex: Regex,
}

impl Normalizer {
    pub fn new(lists: Arc<ReferenceLists>) -> Self {
        Normalizer {
            lists,
            url_regex: Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'\)\]]+"#).unwrap(),
            anchor_regex: Regex::new(
                r#"(?is)<a\s[^>]*href\s*=\s*["']?([^"'\s>]+)["']?[^>]*>(.*?)</a>"#,
            )
            .unwrap(),
            tag_regex: Regex::new(r"(?s)<[^>]*>").unwrap(),
            style_script_regex: Regex::new(r"(?is)<(style|script)[^>]*>.*?</(style|script)>")
                .unwrap(),
            entity_regex: Regex::new(r"&(?:#(\d+)|#x([0-9A-Fa-f]+)|([a-zA-Z][a-zA-Z0-9]*));")
                .unwrap(),
            encoded_word_regex: Regex::new(r"=\?[^?]+\?([bBqQ])\?([^?]*)\?=").unwrap(),
            attachment_regex: Regex::new(
                r#"(?im)^content-(?:disposition|type)\s*:[^\r\n]*?(?:file)?name\s*=\s*"?([^";\r\n]+?)"?\s*(?:;|$)"#,
            )
            .unwrap(),
        }
    }

    /// Total normalization: never fails, regardless of how mangled the input is.
    pub fn normalize(&self, raw: &str) -> NormalizedEmail {
        let (header_block, raw_body) = split_structure(raw);
        let headers = self.parse_headers(header_block);

        let decoded_body = self.decode_transfer_encoding(&headers, raw_body);
        let anchors = self.extract_anchors(&decoded_body);
        let body_text = self.flatten_html(&decoded_body);
        let urls = self.extract_urls(&decoded_body, &headers);
        let attachment_names = self.extract_attachment_names(raw);

        let sender = headers
            .get("from")
            .and_then(|v| v.first())
            .and_then(|v| parse_address(v));
        let reply_to = headers
            .get("reply-to")
            .and_then(|v| v.first())
            .and_then(|v| parse_address(v));
        let display_name = sender.as_ref().and_then(|s| s.display_name.clone());

        NormalizedEmail {
            headers,
            body_text,
            urls,
            anchors,
            sender,
            reply_to,
            display_name,
            attachment_names,
        }
    }

    fn parse_headers(&self, block: &str) -> HashMap<String, Vec<String>> {
        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        let mut current: Option<(String, String)> = None;

        for line in block.lines() {
            if line.starts_with(' ') || line.starts_with('\t') {
                // Folded continuation line
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((key, value)) = current.take() {
                headers
                    .entry(key)
                    .or_default()
                    .push(self.decode_encoded_words(&value));
            }
            if let Some(colon) = line.find(':') {
                let key = line[..colon].trim().to_lowercase();
                let value = line[colon + 1..].trim().to_string();
                if !key.is_empty() {
                    current = Some((key, value));
                }
            }
        }
        if let Some((key, value)) = current.take() {
            headers
                .entry(key)
                .or_default()
                .push(self.decode_encoded_words(&value));
        }

        headers
    }

    /// Decode RFC 2047 encoded words (`=?utf-8?B?...?=` / `=?utf-8?Q?...?=`).
    fn decode_encoded_words(&self, value: &str) -> String {
        self.encoded_word_regex
            .replace_all(value, |caps: &regex::Captures| {
                let encoding = &caps[1];
                let payload = &caps[2];
                match encoding {
                    "b" | "B" => general_purpose::STANDARD
                        .decode(payload)
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                        .unwrap_or_else(|_| caps[0].to_string()),
                    _ => decode_q_encoding(payload),
                }
            })
            .to_string()
    }

    fn decode_transfer_encoding(&self, headers: &HashMap<String, Vec<String>>, body: &str) -> String {
        let cte = headers
            .get("content-transfer-encoding")
            .and_then(|v| v.first())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        if cte.contains("base64") {
            let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
            if let Ok(bytes) = general_purpose::STANDARD.decode(compact.as_bytes()) {
                return String::from_utf8_lossy(&bytes).into_owned();
            }
            log::debug!("declared base64 body failed to decode, keeping raw");
        } else if cte.contains("quoted-printable") {
            return decode_quoted_printable(body);
        }
        body.to_string()
    }

    fn extract_anchors(&self, body: &str) -> Vec<Anchor> {
        self.anchor_regex
            .captures_iter(body)
            .filter_map(|caps| {
                let href = caps.get(1)?.as_str().trim().to_string();
                let inner = caps.get(2)?.as_str();
                let text = self.collapse(&self.decode_entities(&self.tag_regex.replace_all(inner, " ")));
                if href.is_empty() {
                    return None;
                }
                Some(Anchor { href, text })
            })
            .collect()
    }

    fn flatten_html(&self, body: &str) -> String {
        let without_blocks = self.style_script_regex.replace_all(body, " ");
        let without_tags = self.tag_regex.replace_all(&without_blocks, " ");
        let decoded = self.decode_entities(&without_tags);
        let visible: String = decoded
            .chars()
            .filter(|c| !INVISIBLE_CHARS.contains(c))
            .collect();
        self.collapse(&visible)
    }

    fn decode_entities(&self, text: &str) -> String {
        self.entity_regex
            .replace_all(text, |caps: &regex::Captures| {
                if let Some(dec) = caps.get(1) {
                    if let Ok(code) = dec.as_str().parse::<u32>() {
                        if let Some(ch) = char::from_u32(code) {
                            return ch.to_string();
                        }
                    }
                } else if let Some(hex) = caps.get(2) {
                    if let Ok(code) = u32::from_str_radix(hex.as_str(), 16) {
                        if let Some(ch) = char::from_u32(code) {
                            return ch.to_string();
                        }
                    }
                } else if let Some(named) = caps.get(3) {
                    return match named.as_str() {
                        "amp" => "&".to_string(),
                        "lt" => "<".to_string(),
                        "gt" => ">".to_string(),
                        "quot" => "\"".to_string(),
                        "apos" => "'".to_string(),
                        "nbsp" => " ".to_string(),
                        _ => caps[0].to_string(),
                    };
                }
                caps[0].to_string()
            })
            .to_string()
    }

    fn collapse(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn extract_urls(
        &self,
        body: &str,
        headers: &HashMap<String, Vec<String>>,
    ) -> Vec<ExtractedUrl> {
        let mut candidates: Vec<String> = Vec::new();

        for m in self.url_regex.find_iter(body) {
            candidates.push(m.as_str().to_string());
        }
        // List-Unsubscribe carries <url>, <mailto:...> pairs
        for value in headers.get("list-unsubscribe").into_iter().flatten() {
            for m in self.url_regex.find_iter(value) {
                candidates.push(m.as_str().to_string());
            }
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut urls = Vec::new();
        for raw in candidates {
            if let Some(extracted) = self.classify_url(&raw) {
                let key = format!(
                    "{}://{}{}",
                    extracted.scheme, extracted.host, extracted.path
                );
                if seen.insert(key) {
                    urls.push(extracted);
                }
            }
        }
        urls
    }

    fn classify_url(&self, raw: &str) -> Option<ExtractedUrl> {
        let trimmed = raw.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '>', '"', '\'']);
        let with_scheme = if trimmed.to_lowercase().starts_with("www.") {
            format!("http://{trimmed}")
        } else {
            trimmed.to_string()
        };

        let parsed = Url::parse(&with_scheme).ok()?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return None;
        }

        let (host, has_ip_host) = match parsed.host()? {
            Host::Domain(d) => (d.to_lowercase(), false),
            Host::Ipv4(ip) => (ip.to_string(), true),
            Host::Ipv6(ip) => (ip.to_string(), true),
        };

        let punycode_host = if host.contains("xn--") {
            let (unicode, _) = idna::domain_to_unicode(&host);
            Some(unicode)
        } else {
            None
        };

        Some(ExtractedUrl {
            raw: trimmed.to_string(),
            scheme: parsed.scheme().to_string(),
            path: parsed.path().to_string(),
            is_shortened: self.lists.is_shortener(&host),
            has_ip_host,
            punycode_host,
            host,
        })
    }

    fn extract_attachment_names(&self, raw: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for caps in self.attachment_regex.captures_iter(raw) {
            let name = caps[1].trim().to_string();
            // Part names without an extension are boundary noise, not files
            if name.contains('.') && name.len() < 128 && seen.insert(name.to_lowercase()) {
                names.push(name);
            }
        }
        names
    }
}

/// Split the header block from the body at the first blank line. The block
/// only counts as headers when every top-level line is `Name: value`;
/// otherwise the whole input is body.
fn split_structure(raw: &str) -> (&str, &str) {
    let (candidate, body) = if let Some(pos) = raw.find("\r\n\r\n") {
        (&raw[..pos], &raw[pos + 4..])
    } else if let Some(pos) = raw.find("\n\n") {
        (&raw[..pos], &raw[pos + 2..])
    } else {
        return ("", raw);
    };

    let looks_like_headers = !candidate.is_empty()
        && candidate.lines().all(|line| {
            line.starts_with(' ')
                || line.starts_with('\t')
                || line
                    .find(':')
                    .map(|pos| pos > 0 && line[..pos].chars().all(|c| c.is_ascii_graphic()))
                    .unwrap_or(false)
        });

    if looks_like_headers {
        (candidate, body)
    } else {
        ("", raw)
    }
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    Some(hex_nibble(hi)? << 4 | hex_nibble(lo)?)
}

fn decode_q_encoding(payload: &str) -> String {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' => {
                if i + 2 < bytes.len() {
                    if let Some(byte) = hex_pair(bytes[i + 1], bytes[i + 2]) {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                }
                out.push(b'=');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn decode_quoted_printable(body: &str) -> String {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft line break: =\r\n or =\n
            if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                i += 2;
                continue;
            }
            if i + 2 < bytes.len() && bytes[i + 1] == b'\r' && bytes[i + 2] == b'\n' {
                i += 3;
                continue;
            }
            if i + 2 < bytes.len() {
                if let Some(byte) = hex_pair(bytes[i + 1], bytes[i + 2]) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
