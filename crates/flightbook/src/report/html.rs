//! HTML rendering of flight reports.
//!
//! Documents are self-contained: the stylesheet is embedded and signature
//! images are inline data URIs. Every interpolated value is escaped.

use std::fmt::Write as _;
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::warn;

use super::{render_blocking, Document, FlightReport, ReportRenderer};
use crate::error::Result;
use crate::model::units::{format_clock, format_duration_secs, format_hours};
use crate::model::Flight;

/// Heading printed on every report.
pub const REPORT_HEADING: &str = "DRAGOM FLIGHT MANAGER - REPORTE DE VUELO";

/// Signature payloads longer than this are truncated.
pub const SIGNATURE_MAX_BASE64: usize = 500_000;

/// Length an oversize signature is truncated to.
pub const SIGNATURE_TRUNCATE_TO: usize = 100_000;

/// Stylesheet embedded in every report.
pub const REPORT_CSS: &str = r"
* { padding: 0; margin: 0; box-sizing: border-box; font-family: Arial, sans-serif; font-size: 12px; }
html, body { margin: 0; padding: 0; font-size: 11px; }
h1 { font-size: 16px; margin: 8px 0; text-align: center; }
h2 { font-size: 13px; margin: 10px 0 4px; }
table { width: 100%; border-collapse: collapse; table-layout: fixed; margin-bottom: 6px; }
th, td { border: 1px solid black; vertical-align: middle; padding: 4px; word-wrap: break-word; }
.col1 { width: 26%; } .col2 { width: 38%; } .col3 { width: 36%; }
.center { text-align: center; }
.gray { background-color: #838383; font-weight: bold; }
.status { font-size: 14px; font-weight: bold; text-align: center; margin: 8px 0; }
.signatures td { width: 25%; padding: 6px; border: 1px solid #666; background-color: #f9f9f9; text-align: center; height: 80px; }
.signatures img { max-width: 200px; max-height: 80px; }
footer { margin-top: 12px; font-size: 9px; color: #555; }
.page-break { page-break-after: always; }
";

/// Escape text for interpolation into HTML content or attribute values.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn signature_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:image/[^;]+;base64,([A-Za-z0-9+/=]+)$")
            .expect("valid signature pattern")
    })
}

/// Check that a signature is an inline base64 image and bound its size.
///
/// Returns `None` for anything that is not `data:image/<kind>;base64,<data>`
/// with a base64-alphabet payload. Values whose payload exceeds
/// [`SIGNATURE_MAX_BASE64`] are cut to [`SIGNATURE_TRUNCATE_TO`] characters.
#[must_use]
pub fn sanitize_signature(signature: &str) -> Option<String> {
    let caps = signature_pattern().captures(signature)?;
    let data = caps.get(1)?.as_str();
    if data.len() > SIGNATURE_MAX_BASE64 {
        warn!("Signature too large, truncating");
        // The whole value is ASCII once it matched the pattern.
        return Some(signature[..SIGNATURE_TRUNCATE_TO].to_string());
    }
    Some(signature.to_string())
}

/// BLAKE3 digest of a report body, as hex.
#[must_use]
pub fn digest(body: &str) -> String {
    blake3::hash(body.as_bytes()).to_hex().to_string()
}

fn format_instant(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn format_millis(ms: i64) -> String {
    format_instant(DateTime::from_timestamp_millis(ms))
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Sí"
    } else {
        "No"
    }
}

fn section(out: &mut String, heading: &str, rows: &[(&str, String)]) {
    let _ = write!(out, "<h2>{}</h2><table>", escape(heading));
    for (label, value) in rows {
        let _ = write!(
            out,
            r#"<tr><td class="col1 gray">{}</td><td>{}</td></tr>"#,
            escape(label),
            escape(value)
        );
    }
    out.push_str("</table>");
}

fn header(out: &mut String, subtitle: &str) {
    let _ = write!(
        out,
        r#"<h1>{}</h1><table><tr><td class="col1 center gray">DRAGOM</td><td class="col2 center">REPORTE DE VUELO</td><td class="col3 center">{}</td></tr></table>"#,
        escape(REPORT_HEADING),
        escape(subtitle)
    );
}

fn flight_summary(out: &mut String, flight: &Flight) {
    section(
        out,
        "Vuelo",
        &[
            ("ID", flight.id.map_or_else(|| "-".to_string(), |id| id.to_string())),
            ("Tipo", flight.flight_type.to_string()),
            ("Estado", flight.status.to_string()),
            ("Fecha", format_instant(Some(flight.date))),
            ("Inicio", format_instant(flight.start_time)),
            ("Fin", format_instant(flight.end_time)),
            ("Duración", format_duration_secs(flight.duration_secs)),
        ],
    );
}

/// Wrap a body in a complete document with a digest footer.
fn document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="UTF-8" />
  <title>{title}</title>
  <style>{css}</style>
</head>
<body>
{body}
<footer>BLAKE3 {digest}</footer>
<br class="page-break">
</body>
</html>
"#,
        title = escape(title),
        css = REPORT_CSS,
        body = body,
        digest = digest(body),
    )
}

/// Full report: flight, aircraft, crew, forms, payload, phases and signatures.
#[must_use]
pub fn render_full(report: &FlightReport, title: &str) -> String {
    let flight = &report.flight;
    let mut body = String::new();
    header(&mut body, title);
    flight_summary(&mut body, flight);

    if let Some(aircraft) = &report.aircraft {
        section(
            &mut body,
            "Aeronave",
            &[
                ("Nombre", aircraft.name.clone()),
                ("Matrícula", aircraft.code.clone()),
                ("Part number", aircraft.part_num.clone().unwrap_or_default()),
                ("Serial", aircraft.serial_num.clone().unwrap_or_default()),
                ("Tiempo total", format_hours(aircraft.total_minutes)),
            ],
        );
        if !aircraft.motors.is_empty() {
            body.push_str("<table><tr><th>Motor</th><th>Uso (HH:MM)</th></tr>");
            for motor in &aircraft.motors {
                let _ = write!(
                    body,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape(&motor.code),
                    format_clock(motor.usage_minutes)
                );
            }
            body.push_str("</table>");
        }
    }

    if let Some(equipment) = &flight.equipment {
        let battery_codes: Vec<String> = equipment
            .batteries
            .iter()
            .map(|id| {
                report
                    .aircraft
                    .as_ref()
                    .and_then(|a| a.battery(id))
                    .map_or_else(|| id.clone(), |b| b.code.clone())
            })
            .collect();
        section(
            &mut body,
            "Equipo",
            &[
                ("Baterías", battery_codes.join(", ")),
                ("Cámara", equipment.camera.clone().unwrap_or_else(|| "-".into())),
            ],
        );
    }

    if !report.crew.is_empty() {
        let rows: Vec<(&str, String)> = report
            .crew
            .iter()
            .map(|m| (m.role, m.name.clone()))
            .collect();
        section(&mut body, "Tripulación", &rows);
    }

    if let Some(pre) = &flight.preflight {
        section(
            &mut body,
            "Prevuelo",
            &[
                ("Propósito", pre.purpose.clone()),
                ("Tiempo estimado (min)", pre.estimated_time.clone()),
                ("Ubicación", pre.location.clone()),
            ],
        );
    }

    if let Some(payload) = flight.payload.as_ref().filter(|p| p.has_payload) {
        section(
            &mut body,
            "Carga",
            &[
                ("Peso (kg)", payload.weight.clone()),
                ("Liberada", yes_no(payload.released).to_string()),
                ("Hora de liberación", format_instant(payload.release_time)),
                (
                    "Tiempo desde inicio",
                    payload
                        .release_offset
                        .map_or_else(|| "-".to_string(), format_duration_secs),
                ),
            ],
        );
    }

    if !flight.phases.is_empty() {
        body.push_str("<h2>Fases</h2><table><tr><th>Fase</th><th>Inicio</th><th>Fin</th><th>Duración (s)</th></tr>");
        for phase in &flight.phases {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(phase.name.as_str()),
                format_millis(phase.start_time),
                phase.end_time.map_or_else(|| "abierta".to_string(), format_millis),
                phase
                    .duration
                    .map_or_else(|| "-".to_string(), |d| format!("{d:.1}")),
            );
        }
        body.push_str("</table>");
    }

    if let Some(post) = &flight.postflight {
        section(
            &mut body,
            "Postvuelo",
            &[
                ("Estado", post.status.clone()),
                ("Notas", post.notes.clone()),
            ],
        );
    }

    if let Some(signatures) = flight.signatures.as_ref().filter(|s| !s.is_empty()) {
        body.push_str(r#"<h2>Firmas</h2><table class="signatures"><tr>"#);
        for value in signatures.values() {
            match sanitize_signature(value) {
                Some(uri) => {
                    let _ = write!(body, r#"<td><img src="{}" /></td>"#, escape(&uri));
                }
                None => body.push_str("<td>Firma no válida</td>"),
            }
        }
        body.push_str("</tr><tr>");
        for role in signatures.keys() {
            let _ = write!(body, "<td>{}</td>", escape(role));
        }
        body.push_str("</tr></table>");
    }

    document(title, &body)
}

/// Minimal report: identity, status, date and duration.
#[must_use]
pub fn render_minimal(report: &FlightReport) -> String {
    let title = format!("Flight {}", report.flight_id());
    let mut body = String::new();
    header(&mut body, &title);
    flight_summary(&mut body, &report.flight);
    document(&title, &body)
}

/// Aborted report: the minimal report with the abort status line.
#[must_use]
pub fn render_aborted(report: &FlightReport, reason: Option<&str>) -> String {
    let title = format!("Flight {} ABORTADO", report.flight_id());
    let status = match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("ESTADO DEL VUELO: ABORTADO - {reason}"),
        None => "ESTADO DEL VUELO: ABORTADO".to_string(),
    };
    let mut body = String::new();
    header(&mut body, &title);
    let _ = write!(body, r#"<p class="status">{}</p>"#, escape(&status));
    flight_summary(&mut body, &report.flight);
    document(&title, &body)
}

/// Flight book: one row per flight.
#[must_use]
pub fn render_flight_book(flights: &[Flight]) -> String {
    let title = "Libro de Vuelos";
    let mut body = String::new();
    header(&mut body, title);
    body.push_str(
        "<table><tr><th>ID</th><th>Fecha</th><th>Tipo</th><th>Estado</th><th>Duración</th></tr>",
    );
    for flight in flights {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            flight.id.unwrap_or_default(),
            escape(&format_instant(Some(flight.date))),
            flight.flight_type,
            flight.status,
            format_duration_secs(flight.duration_secs),
        );
    }
    body.push_str("</table>");
    document(title, &body)
}

/// Renders documents as HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

/// A [`Document`] with its data owned, so it can move to a blocking thread.
enum OwnedDocument {
    Full { report: FlightReport, title: String },
    Minimal(FlightReport),
    Aborted { report: FlightReport, reason: Option<String> },
    FlightBook(Vec<Flight>),
}

impl OwnedDocument {
    fn new(doc: &Document<'_>) -> Self {
        match *doc {
            Document::Full { report, title } => Self::Full {
                report: report.clone(),
                title: title.to_string(),
            },
            Document::Minimal(report) => Self::Minimal(report.clone()),
            Document::Aborted { report, reason } => Self::Aborted {
                report: report.clone(),
                reason: reason.map(str::to_string),
            },
            Document::FlightBook(flights) => Self::FlightBook(flights.to_vec()),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Full { report, title } => render_full(report, title),
            Self::Minimal(report) => render_minimal(report),
            Self::Aborted { report, reason } => render_aborted(report, reason.as_deref()),
            Self::FlightBook(flights) => render_flight_book(flights),
        }
    }
}

#[async_trait]
impl ReportRenderer for HtmlRenderer {
    async fn render(&self, doc: &Document<'_>) -> Result<String> {
        let doc = OwnedDocument::new(doc);
        render_blocking(move || Ok(doc.render())).await
    }
}
