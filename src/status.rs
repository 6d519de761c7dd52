//! The heater's error-code dictionary.
//!
//! The codes match the labels printed in the Hayward service manual. The
//! frame carrying the raw status byte has not been identified on the bus
//! yet; the dictionary is wired up so the lookup is a one-liner once it is.

/// Broad classification of an error entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// A sensor or part needs service.
    Hardware,
    /// An operating condition tripped a protection.
    Operational,
}

/// One row of the error dictionary.
#[derive(Copy, Clone, Debug)]
pub struct ErrorEntry {
    /// Raw status byte as reported by the heater.
    pub raw: u8,
    /// Short code shown on the keypad display.
    pub code: &'static str,
    /// Severity classification.
    pub class: ErrorClass,
    /// Human-readable description.
    pub description: &'static str,
    /// Suggested corrective action.
    pub solution: &'static str,
}

/// Default entry reported until the first status byte arrives.
pub const WAITING_FOR_DATA: ErrorEntry = ErrorEntry {
    raw: 0xFF,
    code: "S99",
    class: ErrorClass::Operational,
    description: "Waiting For Data",
    solution: "",
};

/// Every status byte the heater is known to report.
pub static ERROR_CODES: [ErrorEntry; 13] = [
    ErrorEntry {
        raw: 0,
        code: "S00",
        class: ErrorClass::Operational,
        description: "Operational",
        solution: "",
    },
    ErrorEntry {
        raw: 1,
        code: "P01",
        class: ErrorClass::Hardware,
        description: "Water inlet sensor malfunction",
        solution: "Check or replace the sensor.",
    },
    ErrorEntry {
        raw: 2,
        code: "P02",
        class: ErrorClass::Hardware,
        description: "Water outlet sensor malfunction",
        solution: "Check or replace the sensor.",
    },
    ErrorEntry {
        raw: 4,
        code: "P04",
        class: ErrorClass::Hardware,
        description: "Outside temperature sensor malfunction",
        solution: "Check or replace the sensor.",
    },
    ErrorEntry {
        raw: 5,
        code: "P05",
        class: ErrorClass::Hardware,
        description: "Defrost sensor malfunction",
        solution: "Check or replace the sensor.",
    },
    ErrorEntry {
        raw: 6,
        code: "E06",
        class: ErrorClass::Operational,
        description: "Large temperature difference between inlet and outlet water",
        solution: "Check the water flow or system obstruction.",
    },
    ErrorEntry {
        raw: 7,
        code: "E07",
        class: ErrorClass::Operational,
        description: "Antifreeze protection in cooling mode",
        solution: "Check the water flow or outlet water temperature sensor.",
    },
    ErrorEntry {
        raw: 19,
        code: "E19",
        class: ErrorClass::Operational,
        description: "Level 1 antifreeze protection",
        solution: "Ambient or inlet water temperature is too low.",
    },
    ErrorEntry {
        raw: 29,
        code: "E29",
        class: ErrorClass::Operational,
        description: "Level 2 antifreeze protection",
        solution: "Ambient or inlet water temperature is even lower.",
    },
    ErrorEntry {
        raw: 1,
        code: "E01",
        class: ErrorClass::Operational,
        description: "High pressure protection",
        solution: "Check the high pressure switch, the refrigerant circuit pressure, \
                    the water or air flow, the flow controller, the inlet/outlet water \
                    valves and the bypass setting.",
    },
    ErrorEntry {
        raw: 2,
        code: "E02",
        class: ErrorClass::Operational,
        description: "Low pressure protection",
        solution: "Check the low pressure switch and the refrigerant circuit for \
                    leaks. Clean the evaporator surface, check the fan speed and make \
                    sure air circulates freely through the evaporator.",
    },
    ErrorEntry {
        raw: 3,
        code: "E03",
        class: ErrorClass::Operational,
        description: "Flow detector malfunction",
        solution: "Check the water flow, the filtration pump and the flow detector.",
    },
    ErrorEntry {
        raw: 8,
        code: "EE8",
        class: ErrorClass::Operational,
        description: "Communication problem",
        solution: "Check the cable connections.",
    },
];

/// Tracks the heater's current status byte and resolves it against the
/// dictionary.
#[derive(Copy, Clone, Debug)]
pub struct HeaterStatus {
    entry: ErrorEntry,
}

impl HeaterStatus {
    /// Starts out waiting for the first status byte.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entry: WAITING_FOR_DATA,
        }
    }

    /// Resolves a raw status byte. Unknown bytes keep the previous entry.
    pub fn update(&mut self, raw: u8) {
        if let Some(entry) = ERROR_CODES.iter().find(|entry| entry.raw == raw) {
            self.entry = *entry;
        }
    }

    /// The active dictionary entry.
    #[must_use]
    pub const fn entry(&self) -> &ErrorEntry {
        &self.entry
    }

    /// The short code, e.g. `"P01"`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.entry.code
    }

    /// The human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.entry.description
    }

    /// The suggested corrective action.
    #[must_use]
    pub const fn solution(&self) -> &'static str {
        self.entry.solution
    }
}

impl Default for HeaterStatus {
    fn default() -> Self {
        Self::new()
    }
}
