use std::sync::Arc;

use models::{Appointment, AppointmentInput};
use tracing::{info, warn};

use crate::errors::{EntityKind, ServiceError};
use crate::identity::IdentityGenerator;
use crate::services::{AppointmentStore, ResidentStore};
use crate::storage::WriteGate;

#[derive(Clone)]
pub struct AppointmentService {
    appointments: Arc<AppointmentStore>,
    residents: Arc<ResidentStore>,
    ids: Arc<dyn IdentityGenerator>,
    gate: WriteGate,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<AppointmentStore>,
        residents: Arc<ResidentStore>,
        ids: Arc<dyn IdentityGenerator>,
        gate: WriteGate,
    ) -> Self {
        Self { appointments, residents, ids, gate }
    }

    /// Schedule an appointment for an existing resident.
    pub async fn schedule_appointment(
        &self,
        input: AppointmentInput,
    ) -> Result<Appointment, ServiceError> {
        input.validate()?;
        let _gate = self.gate.lock().await;
        if !self.residents.contains_key(&input.resident_id).await {
            warn!(resident_id = %input.resident_id, "schedule_appointment: resident not found");
            return Err(ServiceError::not_found(EntityKind::Resident));
        }
        let appointment = input.into_appointment(self.ids.generate());
        self.appointments.insert(appointment.id.clone(), appointment.clone()).await?;
        info!(appointment_id = %appointment.id, resident_id = %appointment.resident_id, "appointment scheduled");
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment, ServiceError> {
        self.appointments
            .get(&appointment_id.to_string())
            .await
            .ok_or_else(|| ServiceError::not_found(EntityKind::Appointment))
    }

    /// Appointments in id order, optionally for one resident.
    pub async fn list_appointments(&self, resident_id: Option<&str>) -> Vec<Appointment> {
        match resident_id {
            Some(rid) => self.appointments.filter_values(|a| a.resident_id == rid).await,
            None => self.appointments.values().await,
        }
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Appointment, ServiceError> {
        let _gate = self.gate.lock().await;
        let removed = self
            .appointments
            .remove(&appointment_id.to_string())
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Appointment))?;
        info!(%appointment_id, "appointment cancelled");
        Ok(removed)
    }
}
