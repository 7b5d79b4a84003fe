use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum PlacesError {
    Io(std::io::Error),
    XmlParse(quick_xml::Error),
    UnsupportedFormat(String),
    Options(String),
}

impl std::fmt::Display for PlacesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::UnsupportedFormat(tag) => write!(f, "Unsupported waypoint format '{tag}'"),
            Self::Options(msg) => write!(f, "Invalid options: {msg}"),
        }
    }
}

impl std::error::Error for PlacesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::XmlParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlacesError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<quick_xml::Error> for PlacesError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<quick_xml::events::attributes::AttrError> for PlacesError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(e.into())
    }
}

impl From<PlacesError> for JsValue {
    fn from(e: PlacesError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
