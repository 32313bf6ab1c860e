//! A trivial pass-through `Processor`: prints each line it is handed and accepts every
//! watermark immediately. Demonstrates wiring a user processor into
//! `WatermarkingTasklet` without adding any domain logic of its own.

use std::convert::Infallible;

use tasklet_config::log_cli_debug;
use tasklet_core::{InboundStream, OutboundStream, Peek, Processor, Watermark};

#[derive(Debug, Default)]
pub struct PrintingProcessor {
    lines_printed: u64,
}

impl Processor<String> for PrintingProcessor {
    type Error = Infallible;

    fn process(
        &mut self,
        _ordinal: usize,
        inbox: &mut dyn InboundStream<String>,
        _outbound: &mut [Box<dyn OutboundStream<String>>],
    ) -> Result<bool, Self::Error> {
        let mut removed = false;
        loop {
            match inbox.peek() {
                Peek::Item(line) => {
                    println!("{line}");
                    self.lines_printed += 1;
                    inbox.remove();
                    removed = true;
                }
                _ => break,
            }
        }
        Ok(removed)
    }

    fn try_process_watermark(
        &mut self,
        watermark: Watermark,
        _outbound: &mut [Box<dyn OutboundStream<String>>],
    ) -> Result<bool, Self::Error> {
        log_cli_debug!("watermark absorbed", value = watermark.value());
        Ok(true)
    }
}
