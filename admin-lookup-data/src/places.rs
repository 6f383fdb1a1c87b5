//! Newline-delimited JSON codec for places.
//!
//! One JSON object per line. Blank lines are skipped on input. Fields the
//! pipeline does not model are carried through untouched.

use admin_lookup_core::Place;
use futures_util::future;
use futures_util::stream::{Stream, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

/// Errors raised while reading or writing places.
#[derive(Debug, Error)]
pub enum PlaceCodecError {
    /// The input could not be read.
    #[error("failed to read place input at line {line}: {source}")]
    Read {
        /// One-based line number.
        line: usize,
        /// Underlying reader error.
        #[source]
        source: LinesCodecError,
    },
    /// A line was not a valid place record.
    #[error("line {line} is not a valid place record: {source}")]
    Decode {
        /// One-based line number.
        line: usize,
        /// JSON decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// A place could not be serialised.
    #[error("failed to encode place {gid}: {source}")]
    Encode {
        /// Global identifier of the offending place.
        gid: String,
        /// JSON encoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The output could not be written.
    #[error("failed to write places: {0}")]
    Write(#[source] std::io::Error),
}

impl PlaceCodecError {
    /// Whether the error only affects one record and reading may continue.
    #[must_use]
    pub const fn is_record_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Decode one NDJSON line.
///
/// # Errors
///
/// Returns [`PlaceCodecError::Decode`] when `line` is not a place object.
pub fn decode_place(line: &str, line_number: usize) -> Result<Place, PlaceCodecError> {
    serde_json::from_str(line).map_err(|source| PlaceCodecError::Decode {
        line: line_number,
        source,
    })
}

/// Encode a place as a single line without the trailing newline.
///
/// # Errors
///
/// Returns [`PlaceCodecError::Encode`] if serialisation fails.
pub fn encode_place(place: &Place) -> Result<String, PlaceCodecError> {
    serde_json::to_string(place).map_err(|source| PlaceCodecError::Encode {
        gid: place.gid().to_owned(),
        source,
    })
}

/// Stream places from an NDJSON reader.
///
/// A malformed line yields a [`PlaceCodecError::Decode`] item and reading
/// continues; a read failure yields [`PlaceCodecError::Read`] and ends the
/// stream.
///
/// # Examples
/// ```
/// use admin_lookup_data::read_places;
/// use futures_util::StreamExt;
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let input: &[u8] = b"{\"gid\":\"g1\",\"layer\":\"venue\"}\n\n";
/// let places: Vec<_> = read_places(input).collect().await;
/// assert_eq!(places.len(), 1);
/// # });
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn read_places<R>(reader: R) -> impl Stream<Item = Result<Place, PlaceCodecError>> + Send
where
    R: AsyncRead + Send,
{
    FramedRead::new(reader, LinesCodec::new())
        .enumerate()
        .filter_map(|(index, line)| {
            let line_number = index + 1;
            let item = match line {
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(decode_place(&text, line_number)),
                Err(source) => Some(Err(PlaceCodecError::Read {
                    line: line_number,
                    source,
                })),
            };
            future::ready(item)
        })
}

/// Writes places to an NDJSON sink.
#[derive(Debug)]
pub struct PlaceWriter<W> {
    writer: W,
    written: u64,
}

impl<W> PlaceWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Places written so far.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Append one place followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the place cannot be encoded or written.
    pub async fn write(&mut self, place: &Place) -> Result<(), PlaceCodecError> {
        let mut line = encode_place(place)?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(PlaceCodecError::Write)?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered output and return the number of places written.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceCodecError::Write`] if flushing fails.
    pub async fn finish(mut self) -> Result<u64, PlaceCodecError> {
        self.writer.flush().await.map_err(PlaceCodecError::Write)?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_lookup_core::test_support::block_on;
    use admin_lookup_core::{Placetype, ZIP_ADDRESS_KEY};
    use geo::Coord;
    use rstest::rstest;

    const INPUT: &str = concat!(
        r#"{"gid":"openstreetmap:venue:1","layer":"venue","centroid":{"lat":37.7,"lon":-122.4},"name":{"default":"Ferry Building"}}"#,
        "\n",
        "\n",
        "not json\n",
        r#"{"gid":"openstreetmap:venue:2","layer":"venue"}"#,
        "\n",
    );

    #[rstest]
    fn reads_places_and_reports_bad_lines() {
        let items: Vec<_> = block_on(read_places(INPUT.as_bytes()).collect());

        assert_eq!(items.len(), 3);
        let first = items
            .first()
            .and_then(|item| item.as_ref().ok())
            .expect("first line decodes");
        assert_eq!(first.gid(), "openstreetmap:venue:1");
        assert_eq!(first.centroid(), Some(Coord { x: -122.4, y: 37.7 }));
        assert!(first.properties.contains_key("name"));

        match items.get(1) {
            Some(Err(err @ PlaceCodecError::Decode { line, .. })) => {
                assert_eq!(*line, 3);
                assert!(err.is_record_error());
            }
            other => panic!("expected decode error, got {other:?}"),
        }

        let last = items
            .get(2)
            .and_then(|item| item.as_ref().ok())
            .expect("last line decodes");
        assert!(!last.has_centroid());
    }

    #[rstest]
    fn writer_emits_one_line_per_place() {
        let mut place = Place::new("g1", "address")
            .with_centroid(Coord { x: 1.5, y: 2.5 })
            .with_parent_fields([Placetype::Postalcode]);
        place
            .add_parent(Placetype::Postalcode, "94103", "554784671", None)
            .expect("postal code is supported");
        place.set_address(ZIP_ADDRESS_KEY, "94103");

        let (buffer, written) = block_on(async {
            let mut writer = PlaceWriter::new(Vec::new());
            writer.write(&place).await.expect("write first");
            writer.write(&Place::new("g2", "venue")).await.expect("write second");
            let written = writer.written();
            let buffer = writer.writer;
            (buffer, written)
        });

        assert_eq!(written, 2);
        let text = String::from_utf8(buffer).expect("utf-8 output");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let decoded = decode_place(lines.first().expect("first line"), 1).expect("decodes");
        assert_eq!(decoded, place);
    }

    #[rstest]
    fn finish_reports_written_count() {
        let written = block_on(async {
            let mut writer = PlaceWriter::new(Vec::new());
            writer.write(&Place::new("g1", "venue")).await.expect("write");
            writer.finish().await
        })
        .expect("flush succeeds");

        assert_eq!(written, 1);
    }
}
