pub const SYSTEM_PROMPT: &str = "You are a financial sentiment assistant.";

/// User prompt asking for the four numbered report sections.
pub fn analysis_prompt(headline: &str, ticker: &str) -> String {
    format!(
        r#"You are a financial news analyst AI. Analyze the following headline and provide a detailed report in four sections:

1. 📊 Market Summary: Briefly summarize what this headline implies about the overall market or the specific stock ({ticker}).
2. 💡 Investment Advice: Offer concise advice for investors, for example "Hold", "Watch closely", "Buy on dips", or "Avoid for now".
3. 🔮 Future Outlook: Predict the possible short-term direction (e.g., bullish, bearish, volatile, stable) for {ticker} based on this news.
4. 📈 Sentiment Impact: Choose one of [Positive, Negative, Neutral] to indicate the direct impact of the news on {ticker}.

Headline:
"{headline}"

Format the output exactly with numbered sections as instructed."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_ticker_and_headline() {
        let prompt = analysis_prompt("PNB posts record profit", "PNB");
        assert!(prompt.contains("\"PNB posts record profit\""));
        assert!(prompt.contains("the specific stock (PNB)"));
        for marker in ["1. ", "2. ", "3. ", "4. "] {
            assert!(prompt.contains(marker));
        }
        assert!(prompt.contains("[Positive, Negative, Neutral]"));
    }
}
