use async_trait::async_trait;
use holdings_ports::{Deadline, TradeSource, TransportError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split, Stdin};

/// Newline-delimited JSON transport over any buffered reader.
///
/// Lines are yielded as raw bytes so invalid UTF-8 reaches the decoder
/// instead of failing the transport. Blank lines are skipped; end of input
/// closes the source.
pub struct LinesTradeSource<R> {
    lines: Split<R>,
    name: String,
}

impl<R> LinesTradeSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            lines: reader.split(b'\n'),
            name: name.into(),
        }
    }
}

impl LinesTradeSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

#[async_trait]
impl<R> TradeSource for LinesTradeSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next(&mut self, deadline: &Deadline) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            // next_segment is cancel safe
            let segment = deadline
                .run(self.lines.next_segment())
                .await?
                .map_err(|e| TransportError::Io(e.to_string()))?;

            match segment {
                Some(segment) => {
                    let line = segment.trim_ascii();
                    if line.is_empty() {
                        continue;
                    }
                    return Ok(Some(line.to_vec()));
                }
                None => return Ok(None),
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
