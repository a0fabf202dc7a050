use crate::models::Recommendation;

/// Renders recommendations as CSV with a `title,score` header
pub fn to_csv(recommendations: &[Recommendation]) -> String {
    let mut csv = String::from("title,score\n");
    for recommendation in recommendations {
        csv.push_str(&escape_field(&recommendation.title));
        csv.push(',');
        csv.push_str(&format!("{:.4}", recommendation.combined_score));
        csv.push('\n');
    }
    csv
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
