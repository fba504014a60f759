//! Typed business records.
//!
//! JSON uses camelCase. Snake_case names written by the old dashboard are
//! accepted as aliases so stored rows of either shape load into the same type.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::normalize::{embedded_list, flexible_date, optional_text, text_or_number};
use super::validation::{
    validate_contact_number, validate_count, validate_email, validate_required, ValidationError,
    ValidationErrors, Validator,
};
use crate::numbering::DocumentType;

pub const MIN_OBSERVATIONS: usize = 1;
pub const MAX_OBSERVATIONS: usize = 5;
pub const MIN_ENGINEER_REMARKS: usize = 1;
pub const MAX_ENGINEER_REMARKS: usize = 10;

// ============================================================================
// Directory records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CompanyFlag {
    #[serde(alias = "red", alias = "RED")]
    Red,
    #[serde(alias = "yellow", alias = "YELLOW")]
    Yellow,
    #[serde(alias = "green", alias = "GREEN")]
    Green,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub id: Uuid,
    #[serde(alias = "company_name")]
    pub company_name: String,
    pub address: String,
    pub industries: String,
    #[serde(alias = "industries_type")]
    pub industries_type: String,
    #[serde(alias = "gst_number")]
    pub gst_number: String,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub flag: CompanyFlag,
}

impl Validator for Company {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.company_name, "companyName", "Company Name", &mut errors);
        validate_required(&self.address, "address", "Address", &mut errors);
        validate_required(&self.industries, "industries", "Industries", &mut errors);
        validate_required(&self.industries_type, "industriesType", "Industries Type", &mut errors);
        validate_required(&self.gst_number, "gstNumber", "GST Number", &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    #[serde(default)]
    pub id: Uuid,
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "contact_no", deserialize_with = "text_or_number")]
    pub contact_no: String,
    pub email: String,
    pub designation: String,
    #[serde(alias = "company_id")]
    pub company_id: Uuid,
}

impl Validator for ContactPerson {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.first_name, "firstName", "First Name", &mut errors);
        validate_contact_number(&self.contact_no, "contactNo", "Contact No", &mut errors);
        validate_email(&self.email, "email", "Email", &mut errors);
        validate_required(&self.designation, "designation", "Designation", &mut errors);
        if self.company_id.is_nil() {
            errors.add(ValidationError::empty_field("companyId", "Company"));
        }
        errors.into_result()
    }
}

impl ContactPerson {
    /// Emails are unique across contacts, ignoring case.
    pub fn check_unique_email(&self, others: &[ContactPerson]) -> Result<(), ValidationErrors> {
        let email = self.email.trim();
        let taken = others
            .iter()
            .filter(|other| other.id != self.id)
            .any(|other| other.email.trim().eq_ignore_ascii_case(email));
        if taken {
            return Err(ValidationErrors::single(ValidationError::duplicate_email(
                "email", email,
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentModel {
    #[serde(default)]
    pub id: Uuid,
    #[serde(alias = "model_name")]
    pub model_name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub range: String,
}

impl Validator for InstrumentModel {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.model_name, "modelName", "Model Name", &mut errors);
        validate_required(&self.range, "range", "Range", &mut errors);
        errors.into_result()
    }
}

/// Calibration engineer signing certificates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Engineer {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServiceEngineer {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
}

impl Validator for Engineer {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.name, "name", "Name", &mut errors);
        errors.into_result()
    }
}

impl Validator for ServiceEngineer {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.name, "name", "Name", &mut errors);
        errors.into_result()
    }
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CertificateStatus {
    #[serde(alias = "checked")]
    Checked,
    #[serde(alias = "unchecked")]
    Unchecked,
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Checked => "Checked",
            Self::Unchecked => "Unchecked",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    #[serde(alias = "Checked")]
    Checked,
    #[serde(alias = "Unchecked")]
    Unchecked,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Checked => "checked",
            Self::Unchecked => "unchecked",
        })
    }
}

/// One calibration point: gas concentration and the readings around it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Observation {
    #[serde(default, deserialize_with = "text_or_number")]
    pub gas: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub before: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub after: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(default)]
    pub id: Uuid,
    /// Assigned from the certificate sequence when left empty on create.
    #[serde(default, alias = "certificate_no", deserialize_with = "text_or_number")]
    pub certificate_no: String,
    #[serde(alias = "customer_name")]
    pub customer_name: String,
    #[serde(alias = "site_location")]
    pub site_location: String,
    #[serde(alias = "make_model")]
    pub make_model: String,
    #[serde(deserialize_with = "text_or_number")]
    pub range: String,
    #[serde(alias = "serial_no", deserialize_with = "text_or_number")]
    pub serial_no: String,
    #[serde(alias = "calibration_gas")]
    pub calibration_gas: String,
    #[serde(alias = "gas_canister_details")]
    pub gas_canister_details: String,
    #[serde(alias = "date_of_calibration", deserialize_with = "flexible_date")]
    pub date_of_calibration: NaiveDate,
    #[serde(alias = "calibration_due_date", deserialize_with = "flexible_date")]
    pub calibration_due_date: NaiveDate,
    #[serde(default, deserialize_with = "embedded_list")]
    pub observations: Vec<Observation>,
    #[serde(alias = "engineer_name")]
    pub engineer_name: String,
    pub status: CertificateStatus,
    #[serde(default, alias = "company_id", skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Certificate {
    /// Everything except the number, which may still be unassigned.
    pub fn validate_content(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validate_required(&self.customer_name, "customerName", "Customer Name", &mut errors);
        validate_required(&self.site_location, "siteLocation", "Site Location", &mut errors);
        validate_required(&self.make_model, "makeModel", "Make & Model", &mut errors);
        validate_required(&self.range, "range", "Range", &mut errors);
        validate_required(&self.serial_no, "serialNo", "Serial No.", &mut errors);
        validate_required(&self.calibration_gas, "calibrationGas", "Calibration Gas", &mut errors);
        validate_required(
            &self.gas_canister_details,
            "gasCanisterDetails",
            "Gas Canister Details",
            &mut errors,
        );
        validate_required(&self.engineer_name, "engineerName", "Engineer Name", &mut errors);
        if self.calibration_due_date < self.date_of_calibration {
            errors.add(ValidationError::new(
                "calibrationDueDate",
                "Calibration Due Date must not be before Date of Calibration",
            ));
        }
        validate_count(
            self.observations.len(),
            MIN_OBSERVATIONS,
            MAX_OBSERVATIONS,
            "observations",
            "Observations",
            &mut errors,
        );
        for (i, observation) in self.observations.iter().enumerate() {
            let prefix = format!("observations[{i}]");
            validate_required(&observation.gas, &format!("{prefix}.gas"), "Gas", &mut errors);
            validate_required(
                &observation.before,
                &format!("{prefix}.before"),
                "Reading Before",
                &mut errors,
            );
            validate_required(
                &observation.after,
                &format!("{prefix}.after"),
                "Reading After",
                &mut errors,
            );
        }
        errors
    }
}

impl Validator for Certificate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.certificate_no, "certificateNo", "Certificate No.", &mut errors);
        errors.extend(self.validate_content());
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineerRemark {
    #[serde(default, alias = "service_spares", deserialize_with = "text_or_number")]
    pub service_spares: String,
    #[serde(default, alias = "part_no", deserialize_with = "text_or_number")]
    pub part_no: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub rate: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub quantity: String,
    /// Filled in by the caller; never recomputed here.
    #[serde(default, deserialize_with = "text_or_number")]
    pub total: String,
    #[serde(default, alias = "po_no", deserialize_with = "text_or_number")]
    pub po_no: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReport {
    #[serde(default)]
    pub id: Uuid,
    /// Assigned from the service sequence when left empty on create.
    #[serde(default, alias = "report_no", deserialize_with = "text_or_number")]
    pub report_no: String,
    #[serde(alias = "customer_name")]
    pub customer_name: String,
    #[serde(alias = "customer_location")]
    pub customer_location: String,
    #[serde(alias = "contact_person")]
    pub contact_person: String,
    #[serde(alias = "contact_number", deserialize_with = "text_or_number")]
    pub contact_number: String,
    #[serde(alias = "service_engineer")]
    pub service_engineer: String,
    #[serde(default, alias = "service_engineer_id", skip_serializing_if = "Option::is_none")]
    pub service_engineer_id: Option<Uuid>,
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    pub place: String,
    #[serde(alias = "place_options")]
    pub place_options: String,
    #[serde(alias = "nature_of_job")]
    pub nature_of_job: String,
    #[serde(
        alias = "make_model_number_of_the_instrument_quantity",
        alias = "makeModelNumberoftheInstrumentQuantity"
    )]
    pub instrument_make_model_quantity: String,
    #[serde(
        default,
        alias = "serial_number_of_the_instrument_calibrated_ok",
        alias = "serialNumberoftheInstrumentCalibratedOK"
    )]
    pub calibrated_ok_serials: String,
    #[serde(
        default,
        alias = "serial_number_of_the_faulty_non_working_instruments",
        alias = "serialNumberoftheFaultyNonWorkingInstruments"
    )]
    pub faulty_serials: String,
    #[serde(alias = "engineer_report")]
    pub engineer_report: String,
    #[serde(default, alias = "customer_report")]
    pub customer_report: String,
    #[serde(default, alias = "engineer_remarks", deserialize_with = "embedded_list")]
    pub engineer_remarks: Vec<EngineerRemark>,
    #[serde(alias = "engineer_name")]
    pub engineer_name: String,
    #[serde(default, alias = "engineer_id", skip_serializing_if = "Option::is_none")]
    pub engineer_id: Option<Uuid>,
    #[serde(default)]
    pub status: ServiceStatus,
}

impl ServiceReport {
    /// Everything except the number, which may still be unassigned.
    pub fn validate_content(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validate_required(&self.customer_name, "customerName", "Customer Name", &mut errors);
        validate_required(&self.customer_location, "customerLocation", "Customer Location", &mut errors);
        validate_required(&self.contact_person, "contactPerson", "Contact Person", &mut errors);
        validate_contact_number(&self.contact_number, "contactNumber", "Contact Number", &mut errors);
        validate_required(&self.service_engineer, "serviceEngineer", "Service Engineer", &mut errors);
        validate_required(&self.place, "place", "Place", &mut errors);
        validate_required(&self.place_options, "placeOptions", "Place Options", &mut errors);
        validate_required(&self.nature_of_job, "natureOfJob", "Nature of Job", &mut errors);
        validate_required(
            &self.instrument_make_model_quantity,
            "instrumentMakeModelQuantity",
            "Make & Model Number",
            &mut errors,
        );
        validate_required(&self.engineer_report, "engineerReport", "Engineer Report", &mut errors);
        validate_required(&self.engineer_name, "engineerName", "Engineer Name", &mut errors);
        validate_count(
            self.engineer_remarks.len(),
            MIN_ENGINEER_REMARKS,
            MAX_ENGINEER_REMARKS,
            "engineerRemarks",
            "Engineer Remarks",
            &mut errors,
        );
        for (i, remark) in self.engineer_remarks.iter().enumerate() {
            let prefix = format!("engineerRemarks[{i}]");
            validate_required(
                &remark.service_spares,
                &format!("{prefix}.serviceSpares"),
                "Service/Spares",
                &mut errors,
            );
            validate_required(&remark.part_no, &format!("{prefix}.partNo"), "Part No.", &mut errors);
            validate_required(&remark.rate, &format!("{prefix}.rate"), "Rate", &mut errors);
            validate_required(&remark.quantity, &format!("{prefix}.quantity"), "Quantity", &mut errors);
            validate_required(&remark.po_no, &format!("{prefix}.poNo"), "PO No.", &mut errors);
        }
        errors
    }
}

impl Validator for ServiceReport {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.report_no, "reportNo", "Report No.", &mut errors);
        errors.extend(self.validate_content());
        errors.into_result()
    }
}

/// A document the renderer can lay out.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentRecord {
    Certificate(Certificate),
    Service(ServiceReport),
}

impl DocumentRecord {
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Certificate(_) => DocumentType::Certificate,
            Self::Service(_) => DocumentType::Service,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Certificate(c) => c.id,
            Self::Service(s) => s.id,
        }
    }

    /// Canonical document code.
    pub fn code(&self) -> &str {
        match self {
            Self::Certificate(c) => &c.certificate_no,
            Self::Service(s) => &s.report_no,
        }
    }

    pub fn customer_name(&self) -> &str {
        match self {
            Self::Certificate(c) => &c.customer_name,
            Self::Service(s) => &s.customer_name,
        }
    }
}

impl From<Certificate> for DocumentRecord {
    fn from(certificate: Certificate) -> Self {
        Self::Certificate(certificate)
    }
}

impl From<ServiceReport> for DocumentRecord {
    fn from(report: ServiceReport) -> Self {
        Self::Service(report)
    }
}
