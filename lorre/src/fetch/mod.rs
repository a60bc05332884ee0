use lorre_core::DecodeError;

use crate::rpc::NodeClient;

type PathFn<I> = Box<dyn Fn(&I) -> String + Send + Sync>;
type DecodeFn<O> = Box<dyn Fn(&str) -> Result<O, DecodeError> + Send + Sync>;

/// A two-step fetch contract: map an input to an RPC path, then decode the
/// body into a record. Composition is explicit; `decode_both` lets a second
/// decoder read the same fetched body.
pub struct Fetcher<I, O> {
    path: PathFn<I>,
    decode: DecodeFn<O>,
}

impl<I: Send + 'static, O> Fetcher<I, O> {
    pub fn new(
        path: impl Fn(&I) -> String + Send + Sync + 'static,
        decode: impl Fn(&str) -> Result<O, DecodeError> + Send + Sync + 'static,
    ) -> Fetcher<I, O> {
        Fetcher {
            path: Box::new(path),
            decode: Box::new(decode),
        }
    }

    /// Feed one fetched body to two decoders, pairing their outputs.
    pub fn decode_both<O2>(
        self,
        second: impl Fn(&str) -> Result<O2, DecodeError> + Send + Sync + 'static,
    ) -> Fetcher<I, (O, O2)>
    where
        O: 'static,
    {
        let first = self.decode;
        Fetcher {
            path: self.path,
            decode: Box::new(move |body| Ok((first(body)?, second(body)?))),
        }
    }

    /// Fetch every input with bounded concurrency, then decode each body.
    /// A decode failure fails the batch (transport already did), carrying the
    /// offending path and a body excerpt.
    pub async fn run(
        &self,
        client: &NodeClient,
        inputs: Vec<I>,
        concurrency: usize,
    ) -> anyhow::Result<Vec<(I, O)>> {
        let fetched = client
            .batched_get(inputs, |input| (self.path)(input), concurrency)
            .await?;

        fetched
            .into_iter()
            .map(|(input, body)| match (self.decode)(&body) {
                Ok(output) => Ok((input, output)),
                Err(err) => {
                    let excerpt: String = body.chars().take(160).collect();
                    Err(anyhow::Error::new(err)
                        .context(format!("decoding {}: {excerpt}", (self.path)(&input))))
                }
            })
            .collect()
    }
}
