use log::{debug, info};

use super::{QuizDocuments, QuizError, Result};

/// Fetches the quiz and the result table concurrently.
///
/// Each source is either an `http(s)://` URL or a path to a local file. Both
/// have to arrive before the quiz is usable; whichever finishes first waits
/// for the other.
pub async fn load_documents(quiz_source: &str, results_source: &str) -> Result<QuizDocuments> {
    let (quiz, results) = tokio::join!(fetch(quiz_source), fetch(results_source));
    let documents = QuizDocuments::from_json(&quiz?, &results?)?;

    info!(
        "Loaded quiz '{}' with {} questions and {} result tiers",
        documents.quiz().title,
        documents.question_count(),
        documents.result_tiers().len()
    );
    Ok(documents)
}

async fn fetch(source: &str) -> Result<String> {
    if is_remote(source) {
        debug!("Fetching {}", source);
        let response = reqwest::get(source).await?;
        if !response.status().is_success() {
            return Err(QuizError::LoadFailed(format!(
                "{} returned {}",
                source,
                response.status()
            )));
        }
        Ok(response.text().await?)
    } else {
        debug!("Reading {}", source);
        Ok(tokio::fs::read_to_string(source).await?)
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
