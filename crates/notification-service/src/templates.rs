use chrono::{DateTime, Utc};

use crate::HeadlineAlert;

pub struct EmailTemplate;

impl EmailTemplate {
    pub fn subject(alert: &HeadlineAlert) -> String {
        format!("📢 Stock Alert: {} News", alert.sentiment)
    }

    pub fn render(alert: &HeadlineAlert, sent_at: DateTime<Utc>) -> String {
        let accent = match alert.sentiment.as_str() {
            "Positive" => "#22c55e",
            "Negative" => "#ef4444",
            _ => "#64748b",
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"></head>
<body style="margin:0;padding:0;background:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;">
<table width="100%" cellpadding="0" cellspacing="0" style="background:#f1f5f9;padding:32px 0;">
  <tr><td align="center">
    <table width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;overflow:hidden;border-top:4px solid {accent};">
      <tr><td style="padding:16px 20px;">
        <h3>{headline}</h3>
        <p>This news was marked as: <strong>{sentiment}</strong></p>
      </td></tr>
      <tr><td style="padding:16px 20px;border-top:1px solid #e2e8f0;">
        <p style="margin:0;color:#94a3b8;font-size:12px;">Sent at {ts} UTC</p>
      </td></tr>
    </table>
    <p style="color:#94a3b8;font-size:11px;margin-top:16px;">Newsdesk Alerts</p>
  </td></tr>
</table>
</body>
</html>"#,
            headline = escape_html(&alert.headline),
            sentiment = escape_html(&alert.sentiment),
            ts = sent_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_subject_names_sentiment() {
        let alert = HeadlineAlert::new("a@example.com", "Nifty hits record", "Positive");
        assert_eq!(EmailTemplate::subject(&alert), "📢 Stock Alert: Positive News");
    }

    #[test]
    fn test_body_contains_headline_and_sentiment() {
        let alert = HeadlineAlert::new("a@example.com", "Nifty hits record", "Positive");
        let sent_at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 15, 0).unwrap();
        let html = EmailTemplate::render(&alert, sent_at);

        assert!(html.contains("<h3>Nifty hits record</h3>"));
        assert!(html.contains("This news was marked as: <strong>Positive</strong>"));
        assert!(html.contains("Sent at 2024-05-02 09:15:00 UTC"));
    }

    #[test]
    fn test_markup_in_headline_is_escaped() {
        let alert = HeadlineAlert::new("a@example.com", "M&M <b>surges</b>", "Neutral");
        let html = EmailTemplate::render(&alert, Utc::now());
        assert!(html.contains("<h3>M&amp;M &lt;b&gt;surges&lt;/b&gt;</h3>"));
    }
}
