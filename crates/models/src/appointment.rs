use serde::{Deserialize, Serialize};

use crate::errors::{require_non_blank, ModelError};

/// A scheduled event tied to one resident.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub resident_id: String,
    pub date: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
    pub resident_id: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
}

impl AppointmentInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        require_non_blank("date", &self.date)
    }

    pub fn into_appointment(self, id: String) -> Appointment {
        Appointment {
            id,
            resident_id: self.resident_id,
            date: self.date,
            description: self.description,
        }
    }
}
