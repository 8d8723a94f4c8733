//! Hover tooltip layouts shared by the terminal views and the scene file

use crate::record::DisplayRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    DisplayTime,
    Longitude,
    Latitude,
    Radius,
    Thickness,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TooltipField {
    pub label: &'static str,
    pub field: Field,
    /// Fixed decimals, or `None` for the shortest exact form
    pub decimals: Option<usize>,
}

const fn row(label: &'static str, field: Field, decimals: Option<usize>) -> TooltipField {
    TooltipField {
        label,
        field,
        decimals,
    }
}

/// Static full-trajectory view
pub const MAP_TOOLTIP: [TooltipField; 3] = [
    row("DateTime", Field::DisplayTime, None),
    row("Radius", Field::Radius, Some(4)),
    row("Thickness", Field::Thickness, Some(4)),
];

/// Time slider view
pub const SLIDER_TOOLTIP: [TooltipField; 4] = [
    row("Longitude", Field::Longitude, None),
    row("Latitude", Field::Latitude, None),
    row("Radius", Field::Radius, Some(4)),
    row("Thickness", Field::Thickness, Some(4)),
];

fn value(rec: &DisplayRecord, field: Field, decimals: Option<usize>) -> String {
    let number = match field {
        Field::DisplayTime => return rec.display_time.clone(),
        Field::Longitude => rec.record.longitude,
        Field::Latitude => rec.record.latitude,
        Field::Radius => rec.record.radius,
        Field::Thickness => rec.record.thickness,
    };
    match decimals {
        Some(d) => format!("{number:.d$}"),
        None => format!("{number}"),
    }
}

/// `Label: value` lines for one record
pub fn lines(rec: &DisplayRecord, layout: &[TooltipField]) -> Vec<String> {
    layout
        .iter()
        .map(|f| format!("{}: {}", f.label, value(rec, f.field, f.decimals)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{sample, RadiusScale};
    use crate::timefmt::TimeNormalizer;

    fn blob() -> DisplayRecord {
        let mut r = sample("2018-11-30T03:30:00Z", 46.8125, -48.25);
        r.radius = 1234.5;
        r.thickness = 0.123456;
        DisplayRecord::derive(r, &TimeNormalizer::default(), RadiusScale::new(10_000.0))
    }

    #[test]
    fn map_tooltip_shows_local_time() {
        assert_eq!(
            lines(&blob(), &MAP_TOOLTIP),
            vec![
                "DateTime: 2018-11-30 00:00",
                "Radius: 1234.5000",
                "Thickness: 0.1235",
            ]
        );
    }

    #[test]
    fn slider_tooltip_shows_position() {
        let text = lines(&blob(), &SLIDER_TOOLTIP);
        assert_eq!(text[0], "Longitude: -48.25");
        assert_eq!(text[1], "Latitude: 46.8125");
        assert_eq!(text.len(), 4);
    }
}
