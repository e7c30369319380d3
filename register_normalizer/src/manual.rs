/*!

This is the long-form manual for `register_normalizer` and `regprep`.

Electoral registers come out of many different systems. `regprep` reads a register
and writes it back with a fixed set of columns, so that canvassing and mailing tools
can all consume the same file.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values, with a header row
* `excel` Microsoft Excel workbooks (.xlsx, .xlsm, .xls)
* `pdf` Documents with a text layer, read with `pdftotext`
* `image` Scanned pages, read with the `tesseract` OCR engine
* `text` Text already extracted from a document, one register line per line
* `paste` A comma-separated table copied from a spreadsheet

With `auto` (the default), the type is guessed from the extension of the input file.

### `csv` and `excel`

The first row is the header. The columns can come in any order and their names do not
need to be exact: `Elector_Number`, `elector number` and `ELECTOR-NUMBER` are the same
column. The following roles are recognized:

| Role                | Typical column names                              |
|---------------------|---------------------------------------------------|
| elector number      | `Elector Number`, `Elector No`, `Elector ID`      |
| number prefix       | `Elector Number Prefix`, `Prefix`                 |
| number suffix       | `Elector Number Suffix`, `Suffix`                 |
| marker              | `Elector Markers`, `Marker`, `Franchise`          |
| name                | `Name`, `Elector Name`, `Full Name`               |
| postcode            | `Postcode`, `Post Code`, `Postal Code`            |
| first address line  | `Address 1`, `Address Line 1`, `Address`          |
| second address line | `Address 2`, `Address Line 2`                     |

When a register splits the elector number into a prefix, a number and a suffix, they are
joined with dots: `BA`, `12`, `1` becomes `BA.12.1`, and the prefix is the polling
district. When the elector number is a single column, the polling district is its
leading word: `KA2-0042/1` is in `KA2`.

The marker, the name, the postcode and the first address line are mandatory. When some of
them cannot be found, nothing is written and the missing columns are listed.

A file written by `regprep` can be read again: its `PollingDistrict` and
`ElectorMarkerType` columns are kept as they are.

### `pdf`, `image` and `text`

The text of the document is read line by line. Two layouts are understood:

- the compact layout of most registration software:

```text
BA 12 1 F SMITH, JOHN PAUL 4 HIGH STREET FY1 2AB
```

- a layout in columns, separated by two spaces or more:

```text
BA1001  G  DOE, JANE  4 HIGH ST  AB1 2CD
```

The compact layout is tried first. Page headers and other lines that do not look like a
register entry are skipped and reported. If no line can be read, the first lines of the
document are printed to help diagnose the layout.

`pdftotext` (from poppler) and `tesseract` must be installed for the `pdf` and `image`
types. Their location can be given with `--pdftotext` and `--tesseract`.

## Markers

The franchise markers are decoded as follows:

| Code | Description                                       |
|------|---------------------------------------------------|
| F    | Overseas voter – Parliamentary only               |
| G    | EU citizen – local elections only                 |
| B    | EU citizen (retained rights/qualifying)           |
| L    | Peer – local elections only                       |
| M    | Qualifying foreign citizen – local elections only |
| N    | Attainer (not yet voting age)                     |

Several codes can be combined (`FN`). A marker that starts with a date (`01/06/2026`) is
an attainer who becomes eligible on that date. An empty marker means that the elector is
eligible for all local elections.

## Output

The output is a CSV file with the following columns:

`ElectorNumber,PollingDistrict,Name,Postcode,Address1,Address2,ElectorMarkerType`

With `--street`, a `Street` column is added. It is the last comma-separated part of the
first address line.

## Command line

```text
regprep --input register.xlsx --out Clean_Electoral_Register.csv
regprep --input register.pdf --line-strategy heuristic --report stdout
regprep --input-type paste --out stdout < table.csv
```

Run `regprep --help` for the complete list of options.

*/
