//! The `.net` architecture format and its `.phe` parameter extension.
//!
//! ```text
//! ARCHITECTURE
//! nneurons 3
//! nsensors 2
//! nmotors 1
//! nblocks 3
//! 1 0 2 0 0 0 // block to be updated
//! 0 2 1 0 2 0 // connections block
//! 1 2 1 0 0 0 // block to be updated
//! neurons bias, delta, gain, xy position, display
//! 0 0 0 50 400 1
//! 0 0 0 80 400 1
//! 0 0 0 50 50 1
//! FREE PARAMETERS 2
//! 0.500000 	 * 	weight n2 from n0
//! * 	 * 	weight n2 from n1
//! END
//! ```
//!
//! Block lines hold the type, destination start and count, source start and
//! count, and a flag. Neuron lines hold the bias flag, the neuron type, the
//! gain flag, the display position and the display flag.
//!
//! The `FREE PARAMETERS` section only appears in `.phe` files. Each of its
//! lines holds a value and a mutation rate followed by a comment; `*` stands
//! for "don't care". Older files hold only the value: a line is read in the
//! newer layout when it contains a `*` token or when its second token is a
//! number.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write as _},
    iter::{Enumerate, Peekable},
    path::Path,
    str::Lines,
};

use crate::{
    ArchitectureError, DEFAULT_VALUE, MAXN, is_default,
    core::{Block, Neuron, NeuronType},
};

use super::evonet::Evonet;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NetDescription {
    pub(crate) ninputs: usize,
    pub(crate) noutputs: usize,
    pub(crate) neurons: Vec<Neuron>,
    pub(crate) blocks: Vec<Block>,
    /// `(value, mutation)` pairs of the `FREE PARAMETERS` section.
    pub(crate) parameters: Option<Vec<(f32, f32)>>,
}

struct LineReader<'a> {
    path: &'a Path,
    lines: Peekable<Enumerate<Lines<'a>>>,
    last_line: usize,
}

impl<'a> LineReader<'a> {
    fn new(path: &'a Path, content: &'a str) -> Self {
        Self {
            path,
            lines: content.lines().enumerate().peekable(),
            last_line: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ArchitectureError {
        ArchitectureError::Malformed {
            path: self.path.to_owned(),
            line_number: self.last_line,
            message: message.into(),
        }
    }

    fn skip_blank(&mut self) {
        while self.lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.skip_blank();
        self.lines.peek().map(|&(_, l)| l.trim())
    }

    fn next_line(&mut self) -> Result<&'a str, ArchitectureError> {
        self.skip_blank();
        match self.lines.next() {
            Some((i, line)) => {
                self.last_line = i + 1;
                Ok(line.trim())
            }
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn expect(&mut self, header: &str) -> Result<(), ArchitectureError> {
        let line = self.next_line()?;
        if line.starts_with(header) {
            Ok(())
        } else {
            Err(self.error(format!("expected {header:?}")))
        }
    }

    fn count(&mut self, key: &str) -> Result<usize, ArchitectureError> {
        let line = self.next_line()?;
        line.strip_prefix(key)
            .and_then(|rest| rest.trim().parse().ok())
            .ok_or_else(|| self.error(format!("expected \"{key} <count>\"")))
    }

    fn integers(&mut self) -> Result<[i32; 6], ArchitectureError> {
        let line = self.next_line()?;
        let mut tokens = line.split_whitespace().map(str::parse::<i32>);
        let mut row = [0; 6];
        for slot in &mut row {
            *slot = tokens
                .next()
                .and_then(Result::ok)
                .ok_or_else(|| self.error("expected six integers"))?;
        }
        Ok(row)
    }
}

fn parse_value(token: &str) -> Option<f32> {
    if token == "*" {
        Some(DEFAULT_VALUE)
    } else {
        token.parse().ok()
    }
}

/// Parses one line of the `FREE PARAMETERS` section into `(value, mutation)`.
pub(crate) fn parse_parameter_line(line: &str) -> Option<(f32, f32)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let first = *tokens.first()?;
    let second = tokens.get(1).copied();
    let second_is_number = second.is_some_and(|t| t.parse::<f32>().is_ok());

    if tokens.contains(&"*") || second_is_number {
        let value = parse_value(first)?;
        let mutation = match second {
            Some(token) if token == "*" || second_is_number => parse_value(token)?,
            _ => DEFAULT_VALUE,
        };
        Some((value, mutation))
    } else {
        let value: f32 = first.parse().ok()?;
        // a pinned value is not mutated
        let mutation = if is_default(value) { DEFAULT_VALUE } else { 0.0 };
        Some((value, mutation))
    }
}

pub(crate) fn parse(path: &Path, content: &str) -> Result<NetDescription, ArchitectureError> {
    let mut reader = LineReader::new(path, content);
    reader.expect("ARCHITECTURE")?;
    let nneurons = reader.count("nneurons")?;
    if nneurons > MAXN {
        return Err(reader.error(format!("{nneurons} neurons, at most {MAXN} are supported")));
    }
    let ninputs = reader.count("nsensors")?;
    let noutputs = reader.count("nmotors")?;
    if ninputs.saturating_add(noutputs) > nneurons {
        return Err(reader.error(format!(
            "{ninputs} sensors and {noutputs} motors do not fit in {nneurons} neurons"
        )));
    }
    let nblocks = reader.count("nblocks")?;

    let mut blocks = vec![];
    for _ in 0..nblocks {
        let row = reader.integers()?;
        let block = Block::from_row(row).ok_or_else(|| reader.error("invalid block"))?;
        blocks.push(block);
    }

    reader.expect("neurons")?;
    let mut neurons = Vec::with_capacity(nneurons);
    for _ in 0..nneurons {
        let [bias, kind, gain, x, y, display] = reader.integers()?;
        let kind =
            NeuronType::from_code(kind).ok_or_else(|| reader.error("invalid neuron type"))?;
        neurons.push(Neuron {
            kind,
            bias: bias != 0,
            gain: gain != 0,
            position: (x, y),
            display: display != 0,
            ..Neuron::default()
        });
    }

    let mut parameters = None;
    if reader.peek().is_some_and(|l| l.starts_with("FREE PARAMETERS")) {
        let declared = reader.count("FREE PARAMETERS")?;
        let mut values = vec![];
        for _ in 0..declared {
            let line = reader.next_line()?;
            if line == "END" {
                return Err(reader.error(format!(
                    "expected {declared} parameter lines, found {}",
                    values.len()
                )));
            }
            let pair =
                parse_parameter_line(line).ok_or_else(|| reader.error("invalid parameter"))?;
            values.push(pair);
        }
        parameters = Some(values);
    }

    Ok(NetDescription {
        ninputs,
        noutputs,
        neurons,
        blocks,
        parameters,
    })
}

/// Reads `path`, returning `Ok(None)` if it does not exist.
fn read(path: &Path) -> Result<Option<NetDescription>, ArchitectureError> {
    match fs::read_to_string(path) {
        Ok(content) => parse(path, &content).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "network file not found");
            Ok(None)
        }
        Err(source) => Err(ArchitectureError::Io {
            path: path.to_owned(),
            source,
        }),
    }
}

fn format_parameter(value: f32) -> String {
    if is_default(value) {
        "*".to_owned()
    } else {
        format!("{value:.6}")
    }
}

impl Evonet {
    fn neuron_name(&self, index: usize) -> String {
        let label = self.neurons[index].label();
        if label.is_empty() {
            format!("n{index}")
        } else {
            label.to_owned()
        }
    }

    /// Comment describing each free parameter, in traversal order.
    #[must_use]
    pub fn parameter_descriptions(&self) -> Vec<String> {
        let mut names = vec![];
        for (i, _) in self.neurons.iter().enumerate().filter(|(_, n)| n.gain) {
            names.push(format!("gain {}", self.neuron_name(i)));
        }
        for (i, _) in self.neurons.iter().enumerate().filter(|(_, n)| n.bias) {
            names.push(format!("bias {}", self.neuron_name(i)));
        }
        let values = self.params.values();
        for block in &self.blocks {
            match block {
                Block::Connection { dest, src, .. } => {
                    for t in dest.indices() {
                        for s in src.indices() {
                            names.push(format!(
                                "weight {} from {}",
                                self.neuron_name(t),
                                self.neuron_name(s)
                            ));
                        }
                    }
                }
                Block::Update { dest, .. } => {
                    for t in dest.indices() {
                        if self.neurons[t].kind.has_time_constant() {
                            let tau = values
                                .get(names.len())
                                .filter(|p| !is_default(**p))
                                .map_or(0.0, |p| p.abs() / self.weight_range());
                            names.push(format!(
                                "timeconstant {} ({tau:.6})",
                                self.neuron_name(t)
                            ));
                        }
                    }
                }
                Block::Gain { .. } | Block::ModulatedGain { .. } => {}
            }
        }
        names
    }

    fn write_net<W>(&self, writer: &mut W, with_parameters: bool) -> io::Result<()>
    where
        W: io::Write,
    {
        writeln!(writer, "ARCHITECTURE")?;
        writeln!(writer, "nneurons {}", self.nneurons())?;
        writeln!(writer, "nsensors {}", self.ninputs)?;
        writeln!(writer, "nmotors {}", self.noutputs)?;
        writeln!(writer, "nblocks {}", self.blocks.len())?;
        for block in &self.blocks {
            let [kind, ds, dc, ss, sc, flag] = block.to_row();
            writeln!(writer, "{kind} {ds} {dc} {ss} {sc} {flag} // {}", block.comment())?;
        }
        writeln!(writer, "neurons bias, delta, gain, xy position, display")?;
        for n in &self.neurons {
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                u8::from(n.bias),
                n.kind.code(),
                u8::from(n.gain),
                n.position.0,
                n.position.1,
                u8::from(n.display)
            )?;
        }
        if with_parameters {
            writeln!(writer, "FREE PARAMETERS {}", self.free_parameters())?;
            let descriptions = self.parameter_descriptions();
            let values = self.params.values();
            let mutations = self.params.mutations();
            for ((value, mutation), description) in values.iter().zip(mutations).zip(&descriptions)
            {
                writeln!(
                    writer,
                    "{} \t {} \t{description}",
                    format_parameter(*value),
                    format_parameter(*mutation)
                )?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }

    /// Writes the architecture to `path`, and the free parameters with their
    /// mutation rates when `with_parameters` is set.
    pub fn save_architecture(
        &self,
        path: &Path,
        with_parameters: bool,
    ) -> Result<(), ArchitectureError> {
        let io_error = |source| ArchitectureError::Io {
            path: path.to_owned(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        self.write_net(&mut writer, with_parameters)
            .and_then(|()| writer.flush())
            .map_err(io_error)?;
        tracing::info!(path = %path.display(), "controller saved");
        Ok(())
    }

    /// Replaces the architecture with the one described in `path`.
    ///
    /// Returns `Ok(false)` and logs a warning if the file does not exist.
    /// A `FREE PARAMETERS` section, if any, is ignored.
    pub fn load_architecture(&mut self, path: &Path) -> Result<bool, ArchitectureError> {
        let Some(description) = read(path)? else {
            return Ok(false);
        };
        self.set_architecture(
            description.ninputs,
            description.noutputs,
            description.neurons,
            description.blocks,
        )?;
        tracing::info!(path = %path.display(), "network architecture loaded");
        Ok(true)
    }

    /// Loads pinned parameter values and mutation rates from a `.phe` file.
    ///
    /// The architecture of the file replaces the current one when it differs.
    /// Each loaded value is also written into the live parameters. Returns
    /// `Ok(false)` and logs a warning if the file does not exist; a parameter
    /// count that differs from what the architecture requires is an error.
    pub fn load_parameter_overrides(&mut self, path: &Path) -> Result<bool, ArchitectureError> {
        let Some(description) = read(path)? else {
            return Ok(false);
        };
        let Some(parameters) = description.parameters else {
            return Err(ArchitectureError::Malformed {
                path: path.to_owned(),
                line_number: 0,
                message: "missing FREE PARAMETERS section".to_owned(),
            });
        };

        let same_structure = description.ninputs == self.ninputs
            && description.noutputs == self.noutputs
            && description.blocks == self.blocks
            && description.neurons.len() == self.neurons.len()
            && description
                .neurons
                .iter()
                .zip(&self.neurons)
                .all(|(a, b)| a.same_structure(b));
        if !same_structure {
            self.set_architecture(
                description.ninputs,
                description.noutputs,
                description.neurons,
                description.blocks,
            )?;
        }

        if parameters.len() != self.free_parameters() {
            return Err(ArchitectureError::ParameterCountMismatch {
                path: path.to_owned(),
                expected: self.free_parameters(),
                found: parameters.len(),
            });
        }
        for (i, (value, mutation)) in parameters.into_iter().enumerate() {
            self.params.set_loaded(i, value, mutation);
        }
        self.phe_loaded = true;
        tracing::info!(path = %path.display(), "parameter file loaded");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NeuronRange, ProceduralLayout};

    fn sample_net() -> Evonet {
        let layout = ProceduralLayout {
            hidden_type: NeuronType::Delta,
            bias_on_hidden: true,
            recurrent_outputs: true,
            ..ProceduralLayout::default()
        };
        let mut net = Evonet::new();
        net.build_procedural(3, 2, 2, &layout).unwrap();
        net
    }

    mod parameter_lines {
        use super::*;

        #[test]
        fn test_new_format() {
            assert_eq!(parse_parameter_line("0.5 \t 0.1 \tgain h0"), Some((0.5, 0.1)));
            assert_eq!(
                parse_parameter_line("* \t 0.2 \tweight h0 from n1"),
                Some((DEFAULT_VALUE, 0.2))
            );
            assert_eq!(
                parse_parameter_line("1.5 \t * \tbias h1"),
                Some((1.5, DEFAULT_VALUE))
            );
            assert_eq!(
                parse_parameter_line("* gain h0"),
                Some((DEFAULT_VALUE, DEFAULT_VALUE))
            );
        }

        #[test]
        fn test_old_format_pins_values() {
            assert_eq!(parse_parameter_line("-2.5 weight o0 from i1"), Some((-2.5, 0.0)));
            assert_eq!(parse_parameter_line("3"), Some((3.0, 0.0)));
            assert_eq!(
                parse_parameter_line("-99 weight o0 from i1"),
                Some((DEFAULT_VALUE, DEFAULT_VALUE))
            );
        }

        #[test]
        fn test_invalid_lines() {
            assert!(parse_parameter_line("").is_none());
            assert!(parse_parameter_line("abc def").is_none());
        }
    }

    mod round_trip {
        use super::*;

        #[test]
        fn test_architecture() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("sample.net");
            let net = sample_net();
            net.save_architecture(&path, false).unwrap();

            let mut loaded = Evonet::new();
            assert!(loaded.load_architecture(&path).unwrap());
            assert_eq!(loaded.ninputs(), 3);
            assert_eq!(loaded.nhiddens(), 2);
            assert_eq!(loaded.noutputs(), 2);
            assert_eq!(loaded.nneurons(), 7);
            assert_eq!(loaded.blocks(), net.blocks());
            for (a, b) in loaded.neurons().iter().zip(net.neurons()) {
                assert!(a.same_structure(b));
            }
            assert_eq!(loaded.free_parameters(), net.free_parameters());
        }

        #[test]
        fn test_parameters() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("sample.phe");
            let mut net = sample_net();
            let values: Vec<f32> = (0..net.free_parameters())
                .map(|i| {
                    if i == 3 {
                        DEFAULT_VALUE
                    } else {
                        f32::from(u8::try_from(i).unwrap()) * 0.25 - 2.0
                    }
                })
                .collect();
            net.set_parameters(&values);
            net.save_architecture(&path, true).unwrap();

            let content = fs::read_to_string(&path).unwrap();
            assert!(content.contains("bias n3"));
            assert!(content.contains("weight n5 from n3"));
            assert!(content.contains("timeconstant n3"));
            assert!(content.trim_end().ends_with("END"));

            let mut loaded = Evonet::new();
            assert!(loaded.load_parameter_overrides(&path).unwrap());
            assert!(loaded.phe_file_loaded());
            assert_eq!(loaded.parameters().values(), values.as_slice());
            assert_eq!(loaded.phe_parameters()[3], None);
            assert_eq!(loaded.phe_parameters()[0], Some(-2.0));
            assert!(loaded.mutations().iter().all(Option::is_none));
        }

        #[test]
        fn test_missing_files_are_soft() {
            let dir = tempfile::tempdir().unwrap();
            let mut net = sample_net();
            assert!(!net.load_architecture(&dir.path().join("none.net")).unwrap());
            assert!(
                !net.load_parameter_overrides(&dir.path().join("none.phe"))
                    .unwrap()
            );
            assert_eq!(net.nneurons(), 7);
        }
    }

    mod errors {
        use super::*;

        const HEADER: &str = "ARCHITECTURE\nnneurons 2\nnsensors 1\nnmotors 1\nnblocks 3\n\
            1 0 1 0 0 0 // block to be updated\n\
            0 1 1 0 1 0 // connections block\n\
            1 1 1 0 0 0 // block to be updated\n\
            neurons bias, delta, gain, xy position, display\n\
            0 0 0 50 400 1\n1 0 0 50 50 1\n";

        #[test]
        fn test_parameter_count_mismatch_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("short.phe");
            fs::write(&path, format!("{HEADER}FREE PARAMETERS 1\n0.5 * bias\nEND\n")).unwrap();

            let mut net = Evonet::new();
            let err = net.load_parameter_overrides(&path).unwrap_err();
            assert!(matches!(
                err,
                ArchitectureError::ParameterCountMismatch {
                    expected: 2,
                    found: 1,
                    ..
                }
            ));
        }

        #[test]
        fn test_old_format_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("old.phe");
            fs::write(
                &path,
                format!("{HEADER}FREE PARAMETERS 2\n1.0 bias o0\n-99 weight o0 from i0\nEND\n"),
            )
            .unwrap();

            let mut net = Evonet::new();
            net.load_parameter_overrides(&path).unwrap();
            assert_eq!(net.mutations(), vec![Some(0.0), None]);
            assert_eq!(net.free_parameter(0), Some(1.0));
        }

        #[test]
        fn test_truncated_section() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cut.phe");
            fs::write(&path, format!("{HEADER}FREE PARAMETERS 2\n1.0 * bias\nEND\n")).unwrap();
            let err = Evonet::new().load_parameter_overrides(&path).unwrap_err();
            assert!(matches!(err, ArchitectureError::Malformed { .. }));
        }

        #[test]
        fn test_malformed_architecture() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("bad.net");
            fs::write(&path, "ARCHITECTURE\nnneurons two\n").unwrap();
            let err = Evonet::new().load_architecture(&path).unwrap_err();
            assert!(matches!(
                err,
                ArchitectureError::Malformed { line_number: 2, .. }
            ));
        }

        #[test]
        fn test_oversized_header_counts() {
            let path = Path::new("x.net");
            let huge = "ARCHITECTURE\nnneurons 1\nnsensors 0\nnmotors 0\nnblocks 1000000000000000000\n";
            assert!(matches!(
                parse(path, huge),
                Err(ArchitectureError::Malformed { .. })
            ));

            let too_many = format!("ARCHITECTURE\nnneurons {}\nnsensors 0\n", MAXN + 1);
            assert!(matches!(
                parse(path, &too_many),
                Err(ArchitectureError::Malformed { line_number: 2, .. })
            ));

            let overlapping = "ARCHITECTURE\nnneurons 2\nnsensors 2\nnmotors 1\nnblocks 0\n";
            assert!(matches!(
                parse(path, overlapping),
                Err(ArchitectureError::Malformed { line_number: 4, .. })
            ));

            let parameters = format!(
                "{HEADER}FREE PARAMETERS 1000000000000000000\n1.0 * bias\n"
            );
            assert!(matches!(
                parse(path, &parameters),
                Err(ArchitectureError::Malformed { .. })
            ));
        }

        #[test]
        fn test_block_out_of_range() {
            let mut net = Evonet::new();
            let err = net
                .set_architecture(
                    1,
                    1,
                    vec![Neuron::default(); 2],
                    vec![Block::update(NeuronRange::new(1, 2))],
                )
                .unwrap_err();
            assert!(matches!(err, ArchitectureError::BlockOutOfRange { index: 0, .. }));
        }
    }
}
