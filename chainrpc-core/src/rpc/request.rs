use super::{COMPONENT, ProtocolError};
use http::Method;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;

/// A transport-neutral request: verb, path and the two parameter maps.
///
/// Map values are JSON scalars with the outer quotes of strings, enums and datetimes removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RpcRequest {
    pub verb: Method,
    /// Percent-encoded, `/`-separated segments.
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// Form fields of a POST body.
    pub post: BTreeMap<String, String>,
}

impl RpcRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            verb: Method::POST,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_post(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post.insert(name.into(), value.into());
        self
    }

    pub fn is_post(&self) -> bool {
        self.verb == Method::POST
    }

    /// Reads an incoming HTTP request: the URI path, its query string and, for POST, the
    /// form-urlencoded body.
    pub fn from_http<B: AsRef<str>>(request: &http::Request<B>) -> Result<Self, ProtocolError> {
        let uri = request.uri();
        let query = match uri.query() {
            Some(query) => decode_form(query)?,
            None => BTreeMap::new(),
        };

        let post = if request.method() == Method::POST {
            decode_form(request.body().as_ref())?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            verb: request.method().clone(),
            path: uri.path().to_owned(),
            query,
            post,
        })
    }
}

pub(crate) fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

pub(crate) fn decode_component(text: &str) -> Result<String, ProtocolError> {
    percent_decode_str(text)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ProtocolError::InvalidEncoding(text.to_owned()))
}

/// `name=value` pairs joined with `&`, both sides percent-encoded.
pub(crate) fn encode_form(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", encode_component(name), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parses a form-urlencoded string. `+` reads as a space and the first value of a name wins.
pub(crate) fn decode_form(text: &str) -> Result<BTreeMap<String, String>, ProtocolError> {
    let mut params = BTreeMap::new();

    for pair in text.split('&').filter(|pair| !pair.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = decode_component(&name.replace('+', " "))?;
        let value = decode_component(&value.replace('+', " "))?;
        params.entry(name).or_insert(value);
    }

    Ok(params)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_builders() {
        let request = RpcRequest::post("/post").with_post("arg0", "1");
        assert!(request.is_post());
        assert_eq!(request.post.get("arg0").map(String::as_str), Some("1"));

        let request = RpcRequest::get("/query").with_query("arg0", "1");
        assert_eq!(request.verb, Method::GET);
        assert!(request.post.is_empty());
    }

    #[test]
    fn test_form_encoding() {
        let params = BTreeMap::from([
            ("a".to_string(), "hello world".to_string()),
            ("b".to_string(), "x&y=z/Привет".to_string()),
        ]);

        let encoded = encode_form(&params);
        assert_eq!(
            encoded,
            "a=hello%20world&b=x%26y%3Dz%2F%D0%9F%D1%80%D0%B8%D0%B2%D0%B5%D1%82"
        );
        assert_eq!(decode_form(&encoded).unwrap(), params);
        assert_eq!(
            decode_form("a=1+2&a=3&flag").unwrap(),
            BTreeMap::from([
                ("a".to_string(), "1 2".to_string()),
                ("flag".to_string(), String::new()),
            ])
        );
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let error = decode_component("%FF").unwrap_err();
        assert!(matches!(error, ProtocolError::InvalidEncoding(_)));
    }

    #[test]
    fn test_from_http() {
        let request = http::Request::post("http://localhost/humans/create?trace=1")
            .body("human=%7B%22name%22%3A%22John%22%7D".to_string())
            .unwrap();

        let request = RpcRequest::from_http(&request).unwrap();
        assert!(request.is_post());
        assert_eq!(request.path, "/humans/create");
        assert_eq!(request.query.get("trace").map(String::as_str), Some("1"));
        assert_eq!(
            request.post.get("human").map(String::as_str),
            Some(r#"{"name":"John"}"#)
        );
    }
}
