//! Console printer for scalars

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::{self, Write};

use super::traits::TrainingMonitor;
use crate::config::PrinterConfig;
use crate::context::TrainerContext;
use crate::error::{MonitorError, Result};

/// Significant digits printed per value
const PRECISION: usize = 5;

/// Prints pending scalars between steps and/or epochs
pub struct ScalarPrinter {
    enable_step: bool,
    enable_epoch: bool,
    whitelist: Option<HashSet<String>>,
    blacklist: HashSet<String>,
    pending: BTreeMap<String, f64>,
    out: Box<dyn Write + Send>,
}

impl ScalarPrinter {
    /// Printer writing to stdout
    pub fn new(enable_step: bool, enable_epoch: bool) -> Self {
        Self {
            enable_step,
            enable_epoch,
            whitelist: None,
            blacklist: HashSet::new(),
            pending: BTreeMap::new(),
            out: Box::new(io::stdout()),
        }
    }

    /// Printer configured from `config`, writing to stdout
    pub fn from_config(config: &PrinterConfig) -> Self {
        let mut printer = Self::new(config.enable_step, config.enable_epoch);
        printer.whitelist = config.whitelist.clone();
        printer.blacklist = config.blacklist.clone();
        printer
    }

    /// Only print the given names
    pub fn with_whitelist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Never print the given names
    pub fn with_blacklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = names.into_iter().map(Into::into).collect();
        self
    }

    /// Send output to `out` instead of stdout
    pub fn with_writer<W: Write + Send + 'static>(mut self, out: W) -> Self {
        self.out = Box::new(out);
        self
    }

    fn is_printed(&self, name: &str) -> bool {
        let allowed = self.whitelist.as_ref().map_or(true, |w| w.contains(name));
        allowed && !self.blacklist.contains(name)
    }

    fn print_stat(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let lines: Vec<String> = pending
            .iter()
            .filter(|(name, _)| self.is_printed(name))
            .map(|(name, value)| format!("{name}: {}", format_general(*value, PRECISION)))
            .collect();
        for line in lines {
            writeln!(self.out, "{line}").map_err(|e| MonitorError::io("printing scalars", e))?;
        }
        self.out.flush().map_err(|e| MonitorError::io("flushing printer output", e))
    }
}

impl fmt::Debug for ScalarPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarPrinter")
            .field("enable_step", &self.enable_step)
            .field("enable_epoch", &self.enable_epoch)
            .field("whitelist", &self.whitelist)
            .field("blacklist", &self.blacklist)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Default for ScalarPrinter {
    fn default() -> Self {
        Self::new(false, true)
    }
}

impl TrainingMonitor for ScalarPrinter {
    fn put_scalar(&mut self, _ctx: &TrainerContext, name: &str, value: f64) -> Result<()> {
        self.pending.insert(name.to_string(), value);
        Ok(())
    }

    fn trigger_step(&mut self, ctx: &TrainerContext) -> Result<()> {
        if !self.enable_step {
            return Ok(());
        }
        // printed together with the epoch stats instead
        if ctx.is_last_step() && self.enable_epoch {
            return Ok(());
        }
        self.print_stat()
    }

    fn trigger_epoch(&mut self, _ctx: &TrainerContext) -> Result<()> {
        if self.enable_epoch {
            self.print_stat()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ScalarPrinter"
    }
}

/// Format `value` with `precision` significant digits, like C's `%g`
///
/// Scientific notation is used when the decimal exponent is below -4 or at
/// least `precision`; trailing zeros are dropped.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, value);
    let Some(e_pos) = sci.find('e') else {
        return sci;
    };
    let mantissa = &sci[..e_pos];
    let exp: i32 = sci[e_pos + 1..].parse().unwrap_or(0);

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().expect("lock acquisition should succeed").clone())
                .expect("output should be UTF-8")
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock acquisition should succeed").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn printer(enable_step: bool, enable_epoch: bool) -> (ScalarPrinter, SharedBuf) {
        let buf = SharedBuf::default();
        (ScalarPrinter::new(enable_step, enable_epoch).with_writer(buf.clone()), buf)
    }

    #[test]
    fn test_format_general() {
        assert_eq!(format_general(0.3, 5), "0.3");
        assert_eq!(format_general(0.5, 5), "0.5");
        assert_eq!(format_general(1.0, 5), "1");
        assert_eq!(format_general(1.23456789, 5), "1.2346");
        assert_eq!(format_general(12345.0, 5), "12345");
        assert_eq!(format_general(123456.0, 5), "1.2346e+05");
        assert_eq!(format_general(99999.5, 5), "1e+05");
        assert_eq!(format_general(0.0001, 5), "0.0001");
        assert_eq!(format_general(0.00001234, 5), "1.234e-05");
        assert_eq!(format_general(-2.5, 5), "-2.5");
        assert_eq!(format_general(0.0, 5), "0");
    }

    #[test]
    fn test_format_general_non_finite() {
        assert_eq!(format_general(f64::NAN, 5), "nan");
        assert_eq!(format_general(f64::INFINITY, 5), "inf");
        assert_eq!(format_general(f64::NEG_INFINITY, 5), "-inf");
    }

    #[test]
    fn test_epoch_prints_sorted_and_clears() {
        let (mut p, buf) = printer(false, true);
        let ctx = TrainerContext::new(2);
        p.put_scalar(&ctx, "loss", 0.3).expect("put should succeed");
        p.put_scalar(&ctx, "accuracy", 0.91).expect("put should succeed");
        p.trigger_epoch(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "accuracy: 0.91\nloss: 0.3\n");

        p.trigger_epoch(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "accuracy: 0.91\nloss: 0.3\n");
    }

    #[test]
    fn test_step_printing_disabled_by_default() {
        let (mut p, buf) = printer(false, true);
        let mut ctx = TrainerContext::new(4);
        ctx.begin_step(0);
        p.put_scalar(&ctx, "loss", 0.3).expect("put should succeed");
        p.trigger_step(&ctx).expect("trigger should succeed");
        assert!(buf.contents().is_empty());
    }

    #[test]
    fn test_last_step_defers_to_epoch() {
        let (mut p, buf) = printer(true, true);
        let mut ctx = TrainerContext::new(2);

        ctx.begin_step(0);
        p.put_scalar(&ctx, "loss", 0.5).expect("put should succeed");
        p.trigger_step(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "loss: 0.5\n");

        ctx.begin_step(1);
        p.put_scalar(&ctx, "loss", 0.25).expect("put should succeed");
        p.trigger_step(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "loss: 0.5\n");

        p.trigger_epoch(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "loss: 0.5\nloss: 0.25\n");
    }

    #[test]
    fn test_last_step_prints_when_epoch_disabled() {
        let (mut p, buf) = printer(true, false);
        let mut ctx = TrainerContext::new(1);
        ctx.begin_step(0);
        p.put_scalar(&ctx, "loss", 0.5).expect("put should succeed");
        p.trigger_step(&ctx).expect("trigger should succeed");
        p.trigger_epoch(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "loss: 0.5\n");
    }

    #[test]
    fn test_whitelist_and_blacklist() {
        let buf = SharedBuf::default();
        let mut p = ScalarPrinter::default()
            .with_whitelist(["loss", "lr"])
            .with_blacklist(["lr"])
            .with_writer(buf.clone());
        let ctx = TrainerContext::new(1);
        p.put_scalar(&ctx, "loss", 0.5).expect("put should succeed");
        p.put_scalar(&ctx, "lr", 0.01).expect("put should succeed");
        p.put_scalar(&ctx, "accuracy", 0.9).expect("put should succeed");
        p.trigger_epoch(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "loss: 0.5\n");

        // filtered names are dropped, not carried to the next print
        p.trigger_epoch(&ctx).expect("trigger should succeed");
        assert_eq!(buf.contents(), "loss: 0.5\n");
    }

    #[test]
    fn test_from_config() {
        let config = PrinterConfig {
            enable_step: true,
            enable_epoch: false,
            whitelist: None,
            blacklist: ["lr".to_string()].into_iter().collect(),
        };
        let p = ScalarPrinter::from_config(&config);
        assert!(p.enable_step);
        assert!(!p.enable_epoch);
        assert!(!p.is_printed("lr"));
        assert!(p.is_printed("loss"));
    }

    #[test]
    fn test_name_and_debug() {
        let p = ScalarPrinter::default();
        assert_eq!(p.name(), "ScalarPrinter");
        assert!(format!("{p:?}").contains("enable_epoch: true"));
    }
}
