//! Operator checklists run before and after a flight.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::Flight;

const DEPARTURE: &[&str] = &[
    "Verificar estado físico del control",
    "Verificar estado físico de la aeronave",
    "Verificar hélices",
    "Verificar motores",
    "Verificar baterías cargadas",
    "Verificar tablet/celular cargado",
    "Verificar cables de conexión",
    "Verificar zona de despegue segura",
];

const ASSEMBLY: &[&str] = &[
    "Desplegar brazos de la aeronave",
    "Asegurar mecanismos de bloqueo",
    "Instalar hélices correctamente",
    "Instalar batería (sin conectar)",
    "Instalar cámara/payload",
    "Retirar protectores de cámara",
];

const PRE_FLIGHT: &[&str] = &[
    "Encender control remoto",
    "Encender aeronave",
    "Verificar conexión RC-Aeronave",
    "Verificar señal GPS",
    "Calibrar brújula si es necesario",
    "Verificar telemetría en app",
];

const POST_FLIGHT: &[&str] = &[
    "Apagar aeronave",
    "Apagar control remoto",
    "Inspeccionar motores por sobrecalentamiento",
    "Inspeccionar hélices",
    "Inspeccionar batería (hinchazón/daño)",
    "Retirar batería y guardar",
    "Reporte de vuelo correctamente guardado en Bitácora",
];

/// Checklist stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Before leaving for the field.
    Departure,
    /// Aircraft assembly on site.
    Assembly,
    /// Power-on checks before the pre-flight form.
    PreFlight,
    /// After landing.
    PostFlight,
}

/// Where a completed checklist leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Another checklist stage.
    Stage(Stage),
    /// The pre-flight form.
    PreFlightForm,
    /// Back to the dashboard.
    Dashboard,
}

impl Stage {
    /// All stages, in order.
    pub const ALL: [Stage; 4] = [
        Self::Departure,
        Self::Assembly,
        Self::PreFlight,
        Self::PostFlight,
    ];

    /// Item texts of this stage.
    #[must_use]
    pub fn items(self) -> &'static [&'static str] {
        match self {
            Self::Departure => DEPARTURE,
            Self::Assembly => ASSEMBLY,
            Self::PreFlight => PRE_FLIGHT,
            Self::PostFlight => POST_FLIGHT,
        }
    }

    /// What follows this stage.
    #[must_use]
    pub fn next(self) -> Next {
        match self {
            Self::Departure => Next::Stage(Self::Assembly),
            Self::Assembly => Next::Stage(Self::PreFlight),
            Self::PreFlight => Next::PreFlightForm,
            Self::PostFlight => Next::Dashboard,
        }
    }

    /// Stage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Departure => "Departure",
            Self::Assembly => "Assembly",
            Self::PreFlight => "PreFlight",
            Self::PostFlight => "PostFlight",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '-' && *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown checklist stage: {s}"))
    }
}

/// A checklist being filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    stage: Stage,
    checked: Vec<bool>,
}

impl Checklist {
    /// A checklist with nothing checked.
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            checked: vec![false; stage.items().len()],
        }
    }

    /// A checklist for `flight`.
    ///
    /// The last post-flight item is pre-checked once the flight has a report.
    #[must_use]
    pub fn for_flight(stage: Stage, flight: &Flight) -> Self {
        let mut checklist = Self::new(stage);
        if stage == Stage::PostFlight && flight.report_path.is_some() {
            if let Some(last) = checklist.checked.last_mut() {
                *last = true;
            }
        }
        checklist
    }

    /// Stage of this checklist.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Items with their checked state.
    pub fn items(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.stage
            .items()
            .iter()
            .copied()
            .zip(self.checked.iter().copied())
    }

    /// Flip item `index` (zero-based).
    ///
    /// # Errors
    ///
    /// Returns a validation error for an index past the last item.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let item = self.item_mut(index)?;
        *item = !*item;
        Ok(*item)
    }

    /// Mark item `index` (zero-based) as checked.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an index past the last item.
    pub fn check(&mut self, index: usize) -> Result<()> {
        *self.item_mut(index)? = true;
        Ok(())
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut bool> {
        let len = self.checked.len();
        self.checked.get_mut(index).ok_or_else(|| {
            Error::validation("item", format!("expected 1..={len}, got {}", index + 1))
        })
    }

    /// Number of unchecked items.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.checked.iter().filter(|c| !**c).count()
    }

    /// Whether every item is checked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Move on, if every item is checked.
    ///
    /// # Errors
    ///
    /// Returns a validation error while items remain unchecked.
    pub fn advance(&self) -> Result<Next> {
        match self.remaining() {
            0 => Ok(self.stage.next()),
            n => Err(Error::validation(
                "checklist",
                format!("{n} item(s) of the {} checklist are unchecked", self.stage),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Crew, Equipment, FlightType, PreFlight};
    use chrono::Utc;

    #[test]
    fn test_item_counts() {
        assert_eq!(Stage::Departure.items().len(), 8);
        assert_eq!(Stage::Assembly.items().len(), 6);
        assert_eq!(Stage::PreFlight.items().len(), 6);
        assert_eq!(Stage::PostFlight.items().len(), 7);
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::Departure.next(), Next::Stage(Stage::Assembly));
        assert_eq!(Stage::Assembly.next(), Next::Stage(Stage::PreFlight));
        assert_eq!(Stage::PreFlight.next(), Next::PreFlightForm);
        assert_eq!(Stage::PostFlight.next(), Next::Dashboard);
    }

    #[test]
    fn test_stage_parse() {
        assert_eq!("preflight".parse::<Stage>(), Ok(Stage::PreFlight));
        assert_eq!("post-flight".parse::<Stage>(), Ok(Stage::PostFlight));
        assert!("landing".parse::<Stage>().is_err());
    }

    #[test]
    fn test_advance_requires_all_items() {
        let mut checklist = Checklist::new(Stage::Assembly);
        assert!(checklist.advance().unwrap_err().is_validation());

        for i in 0..5 {
            checklist.check(i).unwrap();
        }
        assert_eq!(checklist.remaining(), 1);
        assert!(checklist.advance().is_err());

        checklist.check(5).unwrap();
        checklist.check(5).unwrap();
        assert!(checklist.is_complete());
        assert_eq!(checklist.advance().unwrap(), Next::Stage(Stage::PreFlight));
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mut checklist = Checklist::new(Stage::PreFlight);
        assert!(checklist.toggle(6).is_err());
        assert!(checklist.toggle(0).unwrap());
        assert!(!checklist.toggle(0).unwrap());
    }

    #[test]
    fn test_post_flight_auto_checks_report_item() {
        let mut flight = Flight::scheduled(
            FlightType::Operational,
            Utc::now(),
            Crew {
                pilot_internal: 1,
                pilot_external: 2,
                mission_leader: None,
                flight_engineer: None,
            },
            Equipment::default(),
            PreFlight::default(),
        );
        assert_eq!(Checklist::for_flight(Stage::PostFlight, &flight).remaining(), 7);

        flight.report_path = Some("/reports/Flight_1.html".into());
        let checklist = Checklist::for_flight(Stage::PostFlight, &flight);
        assert_eq!(checklist.remaining(), 6);
        let (text, checked) = checklist.items().last().unwrap();
        assert_eq!(text, "Reporte de vuelo correctamente guardado en Bitácora");
        assert!(checked);

        assert_eq!(Checklist::for_flight(Stage::Departure, &flight).remaining(), 8);
    }
}
