use clap::Parser;

/// This is a pre-processor for electoral registers.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path or empty) The register to convert. If not provided, a comma-separated table
    /// is read from the standard input, as if it was pasted.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default auto) The type of the input: auto, csv, excel, pdf, image, text or paste.
    /// With auto, the type is guessed from the extension of the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, 'stdout' or empty) Where the normalized register is written in CSV format.
    /// Defaults to Clean_Electoral_Register.csv in the current directory.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected normalized register in CSV format.
    /// If provided, regprep will check that its output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, a summary of the conversion will be written
    /// in JSON format to the given location.
    #[clap(long, value_parser)]
    pub report: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// If passed as an argument, the column names must be exactly the expected ones
    /// (after lowercasing) instead of only containing them.
    #[clap(long, takes_value = false)]
    pub exact_headers: bool,

    /// (default fields) When several columns could play the same role: 'fields' takes the
    /// leftmost fitting column, 'candidates' takes the column with the best fitting name.
    #[clap(long, value_parser)]
    pub match_order: Option<String>,

    /// (default three-part) How the prefix, number and suffix are joined: 'three-part' or
    /// 'collapse-repeated-prefix'.
    #[clap(long, value_parser)]
    pub elector_number_format: Option<String>,

    /// (default fallback) How lines of text are read: 'strict', 'heuristic' or 'fallback'
    /// (strict first, then heuristic).
    #[clap(long, value_parser)]
    pub line_strategy: Option<String>,

    /// If passed as an argument, a table without a marker column is accepted. All its electors
    /// are then eligible for all local elections.
    #[clap(long, takes_value = false)]
    pub allow_missing_marker: bool,

    /// If passed as an argument, adds a Street column derived from the first address line.
    #[clap(long, takes_value = false)]
    pub street: bool,

    /// (default pdftotext) The pdftotext program used to read PDF documents.
    #[clap(long, value_parser)]
    pub pdftotext: Option<String>,

    /// (default tesseract) The tesseract program used to read scanned images.
    #[clap(long, value_parser)]
    pub tesseract: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
