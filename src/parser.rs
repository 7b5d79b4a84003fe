use std::path::Path;

use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};

use crate::error::PlacesError;
use crate::waypoint::{Waypoint, WaypointFormat};

type Result<T> = std::result::Result<T, PlacesError>;

const GPX_POINT_TAGS: [&[u8]; 3] = [b"wpt", b"rtept", b"trkpt"];
const GPX_LABEL_TAGS: [&[u8]; 2] = [b"name", b"desc"];
const KML_LABEL_TAGS: [&[u8]; 2] = [b"name", b"description"];

/// Read and parse a waypoint file, best effort.
///
/// An unknown format tag, an unreadable file or a malformed document all
/// yield an empty list. Use [`try_waypoints_from_file`] to see why.
pub fn waypoints_from_file(path: &Path, format_tag: &str) -> Vec<Waypoint> {
    match try_waypoints_from_file(path, format_tag) {
        Ok(points) => points,
        Err(PlacesError::UnsupportedFormat(tag)) => {
            log::debug!("ignoring {} with unsupported format '{tag}'", path.display());
            Vec::new()
        }
        Err(e) => {
            log::warn!("failed to read waypoints from {}: {e}", path.display());
            Vec::new()
        }
    }
}

pub fn try_waypoints_from_file(path: &Path, format_tag: &str) -> Result<Vec<Waypoint>> {
    let format = WaypointFormat::from_tag(format_tag)
        .ok_or_else(|| PlacesError::UnsupportedFormat(format_tag.to_string()))?;
    let xml = std::fs::read_to_string(path)?;
    try_parse_document(&xml, format)
}

/// Parse an in-memory document, best effort. Never fails: a malformed
/// document gives an empty list.
pub fn parse_document(xml: &str, format: WaypointFormat) -> Vec<Waypoint> {
    try_parse_document(xml, format).unwrap_or_else(|e| {
        log::warn!("discarding {} document: {e}", format.tag());
        Vec::new()
    })
}

pub fn try_parse_document(xml: &str, format: WaypointFormat) -> Result<Vec<Waypoint>> {
    match format {
        WaypointFormat::Gpx => parse_gpx(xml),
        WaypointFormat::Kml => parse_kml(xml),
    }
}

/// Collect every `wpt`, `rtept` and `trkpt` in document order.
pub fn parse_gpx(xml: &str) -> Result<Vec<Waypoint>> {
    let mut reader = Reader::from_str(xml);
    let mut points = Vec::new();
    let mut open = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if GPX_POINT_TAGS.contains(&e.local_name().as_ref()) => {
                let (lat, lon) = parse_lat_lon(&e)?;
                let label = read_point_children(&mut reader, &e, &GPX_LABEL_TAGS, None)?.label;
                push_point(&mut points, lat.as_deref(), lon.as_deref(), label);
            }
            Ok(Event::Empty(e)) if GPX_POINT_TAGS.contains(&e.local_name().as_ref()) => {
                let (lat, lon) = parse_lat_lon(&e)?;
                push_point(&mut points, lat.as_deref(), lon.as_deref(), None);
            }
            Ok(Event::Start(e)) => open.push(e.name().0.to_vec()),
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Eof) => match open.last() {
                Some(name) => return Err(missing_end_tag(name)),
                None => break,
            },
            Err(e) => return Err(PlacesError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(points)
}

/// Collect every `Placemark` carrying a `coordinates` element.
pub fn parse_kml(xml: &str) -> Result<Vec<Waypoint>> {
    let mut reader = Reader::from_str(xml);
    let mut points = Vec::new();
    let mut open = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"Placemark" => {
                let children = read_point_children(
                    &mut reader,
                    &e,
                    &KML_LABEL_TAGS,
                    Some(b"coordinates".as_slice()),
                )?;
                let Some(coords) = children.coordinates else {
                    log::debug!("skipping Placemark without coordinates");
                    continue;
                };
                let fields: Vec<&str> = coords.trim().split(',').map(str::trim).collect();
                if fields.len() < 2 {
                    log::debug!("skipping Placemark with coordinates '{coords}'");
                    continue;
                }
                push_point(&mut points, Some(fields[1]), Some(fields[0]), children.label);
            }
            Ok(Event::Start(e)) => open.push(e.name().0.to_vec()),
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Eof) => match open.last() {
                Some(name) => return Err(missing_end_tag(name)),
                None => break,
            },
            Err(e) => return Err(PlacesError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(points)
}

/// Append a record if the coordinates are usable. The sequence index is the
/// number of records accepted so far, so indices stay contiguous.
fn push_point(points: &mut Vec<Waypoint>, lat: Option<&str>, lon: Option<&str>, label: Option<String>) {
    let (Some(lat), Some(lon)) = (lat, lon) else {
        log::debug!("skipping point without lat/lon");
        return;
    };
    match Waypoint::new(lat, lon, label.as_deref(), points.len()) {
        Some(wpt) => points.push(wpt),
        None => log::debug!("skipping point with unusable coordinates ({lat}, {lon})"),
    }
}

/// The document ended while `name` was still open. quick-xml reports a
/// plain `Eof` in that case, so the caller has to notice.
fn missing_end_tag(name: &[u8]) -> PlacesError {
    let name = String::from_utf8_lossy(name).into_owned();
    PlacesError::XmlParse(IllFormedError::MissingEndTag(name).into())
}

/// Read the `lat`/`lon` attributes of a GPX point element.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<(Option<String>, Option<String>)> {
    let mut lat = None;
    let mut lon = None;

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(val.to_string()),
            b"lon" => lon = Some(val.to_string()),
            _ => {}
        }
    }

    Ok((lat, lon))
}

#[derive(Debug, Default)]
struct PointChildren {
    label: Option<String>,
    coordinates: Option<String>,
}

/// Walk the descendants of a point element up to its end tag, keeping the
/// text of the first label element and, if asked, of the first coordinates
/// element. Called right after the point's `Event::Start`.
fn read_point_children<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'_>,
    label_tags: &[&[u8]],
    coordinates_tag: Option<&[u8]>,
) -> Result<PointChildren> {
    let mut children = PointChildren::default();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                if children.label.is_none() && label_tags.contains(&local.as_ref()) {
                    children.label = Some(read_text_owned(reader, &e)?);
                } else if children.coordinates.is_none() && coordinates_tag == Some(local.as_ref()) {
                    children.coordinates = Some(read_text_owned(reader, &e)?);
                } else {
                    depth += 1;
                }
            }
            Ok(Event::Empty(e)) => {
                let local = e.local_name();
                if children.label.is_none() && label_tags.contains(&local.as_ref()) {
                    children.label = Some(String::new());
                } else if children.coordinates.is_none() && coordinates_tag == Some(local.as_ref()) {
                    children.coordinates = Some(String::new());
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => return Err(missing_end_tag(start.name().0)),
            Err(e) => return Err(PlacesError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(children)
}

/// Read the text content of an element, descendants included, as an owned
/// String. Handles regular text, CDATA sections and entity references.
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::Start(e)) if e.name().0 == end_name.as_slice() => depth += 1,
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => return Err(missing_end_tag(&end_name)),
            Err(e) => return Err(PlacesError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(points: &[Waypoint]) -> Vec<(&str, &str, &str, usize)> {
        points
            .iter()
            .map(|p| (p.lat(), p.lon(), p.name(), p.sequence_index()))
            .collect()
    }

    #[test]
    fn test_three_waypoints() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="1.0" lon="2.0"><name>B</name></wpt>
  <wpt lat="3.0" lon="4.0"><name>A</name></wpt>
  <wpt lat="5.0" lon="6.0"/>
</gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(
            summary(&points),
            vec![
                ("1.0", "2.0", "B", 0),
                ("3.0", "4.0", "A", 1),
                ("5.0", "6.0", "[undefined]", 2),
            ]
        );
    }

    #[test]
    fn test_all_point_kinds_share_one_counter() {
        let xml = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
  <wpt lat="35.0" lon="139.0"><name>Summit</name></wpt>
  <rte>
    <name>Route name is not a point label</name>
    <rtept lat="35.1" lon="139.1"/>
    <rtept lat="35.2" lon="139.2"><desc>Bridge</desc></rtept>
  </rte>
  <trk>
    <trkseg>
      <trkpt lat="35.3" lon="139.3"><ele>12.0</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(
            summary(&points),
            vec![
                ("35.0", "139.0", "Summit", 0),
                ("35.1", "139.1", "[undefined]", 1),
                ("35.2", "139.2", "Bridge", 2),
                ("35.3", "139.3", "[undefined]", 3),
            ]
        );
    }

    #[test]
    fn test_first_label_in_document_order() {
        let xml = r#"<gpx>
  <wpt lat="1" lon="2"><desc>described first</desc><name>named second</name></wpt>
  <wpt lat="3" lon="4"><name>  padded  </name><desc>ignored</desc></wpt>
</gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(points[0].name(), "described first");
        assert_eq!(points[1].name(), "padded");
    }

    #[test]
    fn test_missing_coordinates_skipped_without_gaps() {
        let xml = r#"<gpx>
  <wpt lat="35.0" lon="139.0"><name>Good</name></wpt>
  <wpt><name>No coords</name></wpt>
  <wpt lat="  " lon="139.0"><name>Blank lat</name></wpt>
  <rtept lat="abc" lon="1.0"/>
  <trkpt lat="36.0" lon="140.0"><name>Also Good</name></trkpt>
</gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(
            summary(&points),
            vec![("35.0", "139.0", "Good", 0), ("36.0", "140.0", "Also Good", 1)]
        );
    }

    #[test]
    fn test_attributes_trimmed() {
        let xml = r#"<gpx><wpt lat=" 1.5 " lon=" 2.5"/></gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(points[0].lat(), "1.5");
        assert_eq!(points[0].lon(), "2.5");
    }

    #[test]
    fn test_extensions_skipped() {
        let xml = r#"<gpx>
  <trk><trkseg>
    <trkpt lat="35.0" lon="139.0">
      <extensions>
        <gpxtpx:TrackPointExtension xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1">
          <gpxtpx:hr>150</gpxtpx:hr>
        </gpxtpx:TrackPointExtension>
      </extensions>
      <name>After extensions</name>
    </trkpt>
    <trkpt lat="35.1" lon="139.1"/>
  </trkseg></trk>
</gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name(), "After extensions");
        assert_eq!(points[1].sequence_index(), 1);
    }

    #[test]
    fn test_cdata_and_entities() {
        let xml = r#"<gpx>
  <wpt lat="1" lon="2"><name><![CDATA[Fish & Chips]]></name></wpt>
  <wpt lat="3" lon="4"><name>Tom &amp; Jerry&#33;</name></wpt>
</gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(points[0].name(), "Fish & Chips");
        assert_eq!(points[1].name(), "Tom & Jerry!");
    }

    #[test]
    fn test_empty_label_element() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><name/></wpt></gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(points[0].name(), "");
    }

    #[test]
    fn test_kml_placemark() {
        let xml = r#"<Placemark><coordinates>10.0,20.0,0</coordinates></Placemark>"#;
        let points = parse_kml(xml).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lon(), "10.0");
        assert_eq!(points[0].lat(), "20.0");
        assert_eq!(points[0].name(), "[undefined]");
        assert_eq!(points[0].sequence_index(), 0);
    }

    #[test]
    fn test_kml_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Document name is not a label</name>
    <Folder>
      <Placemark>
        <description>Harbour</description>
        <name>Pier</name>
        <Point><coordinates> 10.5 , 54.3 , 12 </coordinates></Point>
      </Placemark>
      <Placemark>
        <name>No point</name>
      </Placemark>
      <Placemark>
        <name>Single field</name>
        <Point><coordinates>10.5</coordinates></Point>
      </Placemark>
      <Placemark>
        <name>Flat</name>
        <Point><coordinates>-3.2,55.9</coordinates></Point>
      </Placemark>
    </Folder>
  </Document>
</kml>"#;
        let points = parse_kml(xml).unwrap();
        assert_eq!(
            summary(&points),
            vec![("54.3", "10.5", "Harbour", 0), ("55.9", "-3.2", "Flat", 1)]
        );
    }

    #[test]
    fn test_kml_line_string_takes_first_pair() {
        let xml = r#"<kml><Placemark><name>Path</name>
<LineString><coordinates>
  8.1,47.2,0 8.2,47.3,0
</coordinates></LineString></Placemark></kml>"#;
        let points = parse_kml(xml).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lon(), "8.1");
        assert_eq!(points[0].lat(), "47.2");
    }

    #[test]
    fn test_malformed_document() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><name>x</name></trk></gpx>"#;
        assert!(parse_gpx(xml).is_err());
        assert!(parse_document(xml, WaypointFormat::Gpx).is_empty());
    }

    #[test]
    fn test_truncated_gpx() {
        let cut_in_label = r#"<?xml version="1.0"?><gpx><wpt lat="1.0" lon="2.0"><name>A</name></wpt><wpt lat="3.0" lon="4.0"><name>B"#;
        let err = parse_gpx(cut_in_label).unwrap_err();
        assert!(matches!(
            err,
            PlacesError::XmlParse(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(ref n))) if n == "name"
        ));
        assert!(parse_document(cut_in_label, WaypointFormat::Gpx).is_empty());

        let cut_in_point = r#"<gpx><wpt lat="1.0" lon="2.0"><name>A</name></wpt><wpt lat="3.0" lon="4.0">"#;
        assert!(parse_document(cut_in_point, WaypointFormat::Gpx).is_empty());

        let unclosed_root = r#"<gpx><wpt lat="1.0" lon="2.0"><name>A</name></wpt>"#;
        let err = parse_gpx(unclosed_root).unwrap_err();
        assert!(matches!(
            err,
            PlacesError::XmlParse(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(ref n))) if n == "gpx"
        ));
        assert!(parse_document(unclosed_root, WaypointFormat::Gpx).is_empty());
    }

    #[test]
    fn test_truncated_kml() {
        let cut_in_placemark = r#"<kml><Document>
  <Placemark><name>Pier</name><Point><coordinates>10.5,54.3</coordinates></Point></Placemark>
  <Placemark><name>Cut</name><Point><coordinates>10.6,54.4"#;
        assert!(parse_kml(cut_in_placemark).is_err());
        assert!(parse_document(cut_in_placemark, WaypointFormat::Kml).is_empty());

        let unclosed_document = r#"<kml><Document>
  <Placemark><name>Pier</name><Point><coordinates>10.5,54.3</coordinates></Point></Placemark>"#;
        assert!(parse_document(unclosed_document, WaypointFormat::Kml).is_empty());
    }

    #[test]
    fn test_leading_plus_coordinates() {
        let xml = r#"<gpx><wpt lat="+45.5" lon="+7.25"><name>Plus</name></wpt></gpx>"#;
        let points = parse_gpx(xml).unwrap();
        assert_eq!(summary(&points), vec![("+45.5", "+7.25", "Plus", 0)]);
    }

    #[test]
    fn test_not_xml_at_all() {
        assert!(parse_document("this is not a waypoint file", WaypointFormat::Gpx).is_empty());
        assert!(parse_document("", WaypointFormat::Kml).is_empty());
    }

    #[test]
    fn test_unsupported_format_tag() {
        let err = try_waypoints_from_file(Path::new("whatever.kmz"), "kmz").unwrap_err();
        assert!(matches!(err, PlacesError::UnsupportedFormat(ref t) if t == "kmz"));
        assert!(waypoints_from_file(Path::new("whatever.kmz"), "kmz").is_empty());
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/dir/places.gpx");
        assert!(matches!(
            try_waypoints_from_file(path, "gpx"),
            Err(PlacesError::Io(_))
        ));
        assert!(waypoints_from_file(path, "gpx").is_empty());
    }
}
