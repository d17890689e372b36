// ==========================================
// Plant operations - document templates
// ==========================================
// Registry of export document layouts. Each template names its
// jinja file and lists the fields that must be present (and
// non-null) before rendering.
// ==========================================

use serde::{Deserialize, Serialize};

/// Output format requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Pdf,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DocumentTemplate {
    pub template_id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub doc_type: &'static str,
    pub language: &'static str,
    /// Jinja template under the templates directory
    pub template_file: &'static str,
    pub required_fields: &'static [&'static str],
}

pub const TEMPLATES: [DocumentTemplate; 4] = [
    DocumentTemplate {
        template_id: "health_certificate_cn",
        name: "Health Certificate (Chinese)",
        doc_type: "health_certificate",
        language: "chinese",
        template_file: "health_certificate_cn.html",
        required_fields: &[
            "exporter_name",
            "exporter_address",
            "product_description",
            "production_date",
            "expiry_date",
            "veterinary_inspection",
            "china_importer",
            "port_of_entry",
        ],
    },
    DocumentTemplate {
        template_id: "customs_declaration_cn",
        name: "Customs Declaration (Chinese)",
        doc_type: "customs_declaration",
        language: "chinese",
        template_file: "customs_declaration_cn.html",
        required_fields: &[
            "hs_code",
            "product_value",
            "weight_kg",
            "country_of_origin",
            "transport_method",
            "insurance_value",
        ],
    },
    DocumentTemplate {
        template_id: "certificate_of_origin_cn",
        name: "Certificate of Origin (Chinese)",
        doc_type: "certificate_of_origin",
        language: "chinese",
        template_file: "certificate_of_origin_cn.html",
        required_fields: &[
            "manufacturer",
            "production_facility",
            "origin_criteria",
            "export_license",
        ],
    },
    DocumentTemplate {
        template_id: "veterinary_certificate_cn",
        name: "Veterinary Certificate (Chinese)",
        doc_type: "veterinary_certificate",
        language: "chinese",
        template_file: "veterinary_certificate_cn.html",
        required_fields: &[
            "veterinary_authority",
            "inspection_date",
            "animal_health",
            "laboratory_tests",
        ],
    },
];

pub fn template(template_id: &str) -> Option<&'static DocumentTemplate> {
    TEMPLATES.iter().find(|t| t.template_id == template_id)
}

/// First template matching a document type in the given language
pub fn template_for_type(doc_type: &str, language: &str) -> Option<&'static DocumentTemplate> {
    TEMPLATES
        .iter()
        .find(|t| t.doc_type == doc_type && t.language == language)
}

/// "port_of_entry" -> "Port Of Entry"
pub fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_type_and_language() {
        let t = template_for_type("customs_declaration", "chinese").unwrap();
        assert_eq!(t.template_id, "customs_declaration_cn");
        assert!(template_for_type("customs_declaration", "russian").is_none());
        assert!(template_for_type("packing_list", "chinese").is_none());
    }

    #[test]
    fn test_template_files_follow_ids() {
        for t in TEMPLATES.iter() {
            assert_eq!(t.template_file, format!("{}.html", t.template_id));
        }
    }

    #[test]
    fn test_field_label() {
        assert_eq!(field_label("port_of_entry"), "Port Of Entry");
        assert_eq!(field_label("hs_code"), "Hs Code");
    }
}
