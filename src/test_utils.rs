#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{Quiz, QuizQuestion};

    /// Builds a four-option question whose right answer sits at `correct`.
    pub fn question(text: &str, correct: usize) -> QuizQuestion {
        let options = ["Alpha", "Beta", "Gamma", "Delta"]
            .iter()
            .map(|o| format!("{} ({})", o, text))
            .collect();
        QuizQuestion::new(text, options, correct, Some(format!("Because of {}", text)))
            .expect("fixture question is valid")
    }

    /// Five questions with their right answers spread over every position.
    pub fn five_question_quiz() -> Quiz {
        let questions = vec![
            question("What does a cell membrane regulate?", 0),
            question("Which organelle produces energy?", 2),
            question("Where is DNA stored?", 1),
            question("What do ribosomes build?", 3),
            question("Which process divides a cell?", 2),
        ];
        Quiz::new("Cell Biology", questions).expect("fixture quiz is valid")
    }

    /// A quiz of `n` generated questions, `n >= 1`.
    pub fn quiz_with_questions(n: usize) -> Quiz {
        let questions = (0..n)
            .map(|i| question(&format!("Question number {}", i + 1), i % 4))
            .collect();
        Quiz::new(format!("Generated quiz of {}", n), questions).expect("fixture quiz is valid")
    }

    /// A well-formed model reply wrapped in a code fence.
    pub fn fenced_quiz_response() -> String {
        r#"Here is your quiz:
```json
{
  "quiz_title": "Photosynthesis",
  "questions": [
    {"question": "What gas do plants absorb?", "options": ["Oxygen", "Carbon dioxide", "Helium"], "correct": 1, "explanation": "Plants take in CO2."},
    {"question": "Where does photosynthesis happen?", "options": ["Chloroplast", "Nucleus"], "correct": 0}
  ]
}
```
Good luck!"#
            .to_string()
    }
}

/// A one-shot HTTP server for exercising the real clients.
#[cfg(test)]
pub mod http_stub {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    /// Answers the next request with `status` and `body`. The handle yields
    /// the raw request text.
    pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
        let addr = listener.local_addr().expect("stub address");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept stub connection");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.expect("write stub response");
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{}", addr), handle)
    }

    /// An address nothing listens on.
    pub async fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind throwaway listener");
        let addr = listener.local_addr().expect("throwaway address");
        drop(listener);
        format!("http://{}", addr)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.expect("read stub request");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn five_question_quiz_spreads_answers() {
        let quiz = five_question_quiz();
        assert_eq!(quiz.len(), 5);
        assert_eq!(quiz.title(), "Cell Biology");
        assert!(quiz.questions().iter().all(|q| q.options().len() == 4));
    }

    #[test]
    fn quiz_with_questions_has_requested_length() {
        for n in 1..=6 {
            assert_eq!(quiz_with_questions(n).len(), n);
        }
    }
}
