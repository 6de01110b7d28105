use serde::{Deserialize, Serialize};

use crate::errors::{require_non_blank, ModelError};

/// A person under care.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub medical_history: String,
    pub emergency_contact: String,
    pub healthcare_info: String,
    /// Insertion-ordered, duplicates allowed.
    #[serde(default)]
    pub medications: Vec<String>,
}

/// Admission payload; the id is assigned by the service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResidentInput {
    pub name: String,
    pub age: u8,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub healthcare_info: String,
    #[serde(default)]
    pub medications: Vec<String>,
}

impl ResidentInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        require_non_blank("name", &self.name)
    }

    pub fn into_resident(self, id: String) -> Resident {
        Resident {
            id,
            name: self.name.trim().to_string(),
            age: self.age,
            medical_history: self.medical_history,
            emergency_contact: self.emergency_contact,
            healthcare_info: self.healthcare_info,
            medications: self.medications,
        }
    }
}

impl Resident {
    /// Append at the end; duplicates are kept.
    pub fn add_medication(&mut self, medication: String) {
        self.medications.push(medication);
    }

    /// Remove the first exact match, keeping the order of the rest.
    /// Returns false when the medication is not on the list.
    pub fn remove_medication(&mut self, medication: &str) -> bool {
        match self.medications.iter().position(|m| m == medication) {
            Some(index) => {
                self.medications.remove(index);
                true
            }
            None => false,
        }
    }
}
