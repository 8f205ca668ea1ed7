//! Static advice and risk tables keyed by predicted class

use serde::{Deserialize, Serialize};

/// Fallback advice for labels missing from the table
pub const DEFAULT_RECOMMENDATION: &str = "Konsultasikan dengan tenaga kesehatan profesional.";

const RECOMMENDATIONS: &[(&str, &str)] = &[
    (
        "Insufficient_Weight",
        "Tingkatkan asupan kalori dan nutrisi seimbang. Konsumsi makanan bergizi tinggi protein. \
         Konsultasikan dengan ahli gizi untuk program penambahan berat badan yang sehat.",
    ),
    (
        "Normal_Weight",
        "Pertahankan pola makan sehat dan aktivitas fisik rutin minimal 150 menit per minggu. \
         Lanjutkan gaya hidup sehat Anda!",
    ),
    (
        "Overweight_Level_I",
        "Kurangi kalori harian sekitar 500 kcal, tingkatkan aktivitas fisik menjadi 200 menit per \
         minggu, konsumsi lebih banyak sayuran dan protein rendah lemak.",
    ),
    (
        "Overweight_Level_II",
        "Segera kurangi berat badan 5-10% dalam 6 bulan. Konsultasi dengan ahli gizi untuk program \
         penurunan berat badan terstruktur. Tingkatkan aktivitas fisik intensitas sedang.",
    ),
    (
        "Obesity_Type_I",
        "Butuh intervensi medis. Konsultasi dengan dokter dan ahli gizi. Program penurunan berat \
         badan intensif dengan target 5-10% dalam 6 bulan. Pertimbangkan konseling perilaku.",
    ),
    (
        "Obesity_Type_II",
        "Kondisi serius! Segera konsultasi dengan tim medis (dokter, ahli gizi, psikolog). Mungkin \
         butuh intervensi farmakologis. Program komprehensif dengan monitoring ketat.",
    ),
    (
        "Obesity_Type_III",
        "Kondisi sangat serius! Segera konsultasi dengan spesialis obesitas. Pertimbangkan program \
         penurunan berat badan intensif, terapi farmakologis, atau opsi bedah bariatrik jika \
         diindikasikan.",
    ),
];

/// Advice for a predicted class
pub fn recommendation_for(class: &str) -> &'static str {
    RECOMMENDATIONS
        .iter()
        .find(|(label, _)| *label == class)
        .map(|(_, text)| *text)
        .unwrap_or(DEFAULT_RECOMMENDATION)
}

/// Coarse severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Normal,
    Moderate,
    High,
    VeryHigh,
    Extreme,
    Unknown,
}

impl RiskLevel {
    /// Determine the risk tier from a predicted class label
    pub fn from_class(class: &str) -> Self {
        match class {
            "Insufficient_Weight" => RiskLevel::Low,
            "Normal_Weight" => RiskLevel::Normal,
            "Overweight_Level_I" | "Overweight_Level_II" => RiskLevel::Moderate,
            "Obesity_Type_I" => RiskLevel::High,
            "Obesity_Type_II" => RiskLevel::VeryHigh,
            "Obesity_Type_III" => RiskLevel::Extreme,
            _ => RiskLevel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_class() {
        assert_eq!(RiskLevel::from_class("Insufficient_Weight"), RiskLevel::Low);
        assert_eq!(RiskLevel::from_class("Normal_Weight"), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_class("Overweight_Level_II"), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_class("Obesity_Type_II"), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_class("Obesity_Type_III"), RiskLevel::Extreme);
        assert_eq!(RiskLevel::from_class("normal_weight"), RiskLevel::Unknown);
    }

    #[test]
    fn test_risk_level_serialization() {
        let json = serde_json::to_string(&RiskLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"very_high\"");
    }

    #[test]
    fn test_every_known_class_has_advice() {
        for (label, _) in RECOMMENDATIONS {
            assert_ne!(RiskLevel::from_class(label), RiskLevel::Unknown);
            assert_ne!(recommendation_for(label), DEFAULT_RECOMMENDATION);
        }
        assert_eq!(recommendation_for("Martian"), DEFAULT_RECOMMENDATION);
    }

    #[test]
    fn test_advice_text_is_served_verbatim() {
        assert_eq!(
            recommendation_for("Normal_Weight"),
            "Pertahankan pola makan sehat dan aktivitas fisik rutin minimal 150 menit per minggu. \
             Lanjutkan gaya hidup sehat Anda!"
        );
        assert_eq!(
            recommendation_for("Overweight_Level_I"),
            "Kurangi kalori harian sekitar 500 kcal, tingkatkan aktivitas fisik menjadi 200 menit \
             per minggu, konsumsi lebih banyak sayuran dan protein rendah lemak."
        );
        assert_eq!(
            recommendation_for("Unlisted"),
            "Konsultasikan dengan tenaga kesehatan profesional."
        );
    }
}
