use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use super::LogConfig;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

/// Forward every line of a runner output stream into the log, tagged with the workload name.
pub(crate) async fn forward_lines<R>(reader: R, workload: String, stream: Stream, cfg: LogConfig)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = truncate(&line, cfg.max_line_length);
                match stream {
                    Stream::Stdout if cfg.stdout_info => info!(%workload, "{line}"),
                    Stream::Stderr if cfg.stderr_warn => warn!(%workload, "{line}"),
                    _ => debug!(%workload, ?stream, "{line}"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(%workload, ?stream, error = %e, "runner output stream closed");
                break;
            }
        }
    }
}

fn truncate(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("héllo", 2), "h");
    }
}
