//! Writing of scalar fields as VTK XML rectilinear grid (`.vtr`) files.

pub mod reading;

use super::{utils::AtomicOutputPath, OverwriteMode, Verbosity};
use crate::{
    field::ScalarField3,
    geometry::Dim3::{self, X, Y, Z},
    grid::RectilinearGrid3,
    num::BFloat,
};
use byteorder::{ByteOrder, LittleEndian};
use std::{
    collections::HashSet,
    fmt,
    io::{self, BufWriter, Write},
    mem,
    path::Path,
    str::FromStr,
};
use xml::{
    writer::{events::XmlEvent, EventWriter},
    EmitterConfig,
};

/// Extension of VTK XML rectilinear grid files.
pub const FILE_EXTENSION: &str = "vtr";

/// Names of the coordinate arrays for the x-, y- and z-dimension.
pub const COORDINATE_ARRAY_NAMES: [&str; 3] = ["x_coordinates", "y_coordinates", "z_coordinates"];

/// How array data is stored in the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Values written as text inside each `DataArray` element.
    Ascii,
    /// Values written as little-endian binary blocks after the XML header,
    /// each preceded by its byte count as an unsigned 64-bit integer.
    RawAppended,
}

impl Encoding {
    fn format_attribute(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::RawAppended => "appended",
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(Self::Ascii),
            "raw" => Ok(Self::RawAppended),
            invalid => Err(format!(
                "invalid encoding {} (valid encodings are ascii and raw)",
                invalid
            )),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Ascii => "ascii",
                Self::RawAppended => "raw",
            }
        )
    }
}

/// Floating point types that can be stored in VTK data arrays.
pub trait VtkFloat: BFloat {
    /// Name of the type in the `type` attribute of a `DataArray`.
    const TYPE_NAME: &'static str;

    /// Writes the given values into the byte buffer in little-endian order.
    fn write_into_byte_buffer(values: &[Self], buffer: &mut [u8]);
}

impl VtkFloat for f32 {
    const TYPE_NAME: &'static str = "Float32";

    fn write_into_byte_buffer(values: &[Self], buffer: &mut [u8]) {
        LittleEndian::write_f32_into(values, buffer);
    }
}

impl VtkFloat for f64 {
    const TYPE_NAME: &'static str = "Float64";

    fn write_into_byte_buffer(values: &[Self], buffer: &mut [u8]) {
        LittleEndian::write_f64_into(values, buffer);
    }
}

/// Writes the given grid and point-located fields as a VTK rectilinear grid
/// file at the given path.
///
/// The file is first written to a temporary location and only moved to the
/// output path once complete, so a failure never leaves a partial file.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains `true` if the file was written, or `false` if an
///   existing file was kept because of the overwrite mode.
/// - `Err`: Contains an error encountered while validating the fields or
///   writing the file.
pub fn write_rectilinear_grid_file<F, P>(
    output_file_path: P,
    grid: &RectilinearGrid3<F>,
    fields: &[&ScalarField3<F>],
    encoding: Encoding,
    overwrite_mode: OverwriteMode,
    verbosity: &Verbosity,
) -> io::Result<bool>
where
    F: VtkFloat,
    P: AsRef<Path>,
{
    verify_fields_match_grid(grid, fields)?;

    let mut atomic_output_path = AtomicOutputPath::new(output_file_path)?;
    if !atomic_output_path.write_allowed(overwrite_mode) {
        if verbosity.print_messages() {
            println!(
                "Skipping existing file {}",
                atomic_output_path.target_path().display()
            );
        }
        return Ok(false);
    }

    if verbosity.print_messages() {
        println!(
            "Writing {} to {}",
            fields
                .iter()
                .map(|field| field.name())
                .collect::<Vec<_>>()
                .join(", "),
            atomic_output_path.target_path().display()
        );
    }

    {
        let mut writer = BufWriter::new(atomic_output_path.temporary_file_mut());
        write_rectilinear_grid(&mut writer, grid, fields, encoding)?;
        writer.flush()?;
    }
    atomic_output_path.temporary_file_mut().sync_all()?;
    atomic_output_path.perform_replace()?;
    Ok(true)
}

/// Writes the given grid and point-located fields in VTK rectilinear grid
/// format to the given writer.
///
/// Coordinate arrays are written in the order x, y, z, followed by the
/// fields in the given order. The first field is marked as the active scalars.
pub fn write_rectilinear_grid<F, W>(
    writer: W,
    grid: &RectilinearGrid3<F>,
    fields: &[&ScalarField3<F>],
    encoding: Encoding,
) -> io::Result<()>
where
    F: VtkFloat,
    W: Write,
{
    verify_fields_match_grid(grid, fields)?;

    let mut xml_writer = EmitterConfig::new()
        .perform_indent(true)
        .create_writer(writer);

    write_document(&mut xml_writer, grid, fields, encoding).map_err(|err| match err {
        xml::writer::Error::Io(err) => err,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    })
}

fn verify_fields_match_grid<F: BFloat>(
    grid: &RectilinearGrid3<F>,
    fields: &[&ScalarField3<F>],
) -> io::Result<()> {
    let grid_shape = grid.shape();
    let mut names = HashSet::with_capacity(fields.len());
    for field in fields {
        let values_shape = field.values().shape();
        if values_shape != [grid_shape[X], grid_shape[Y], grid_shape[Z]] {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Shape of field {} ({:?}) does not match shape of grid ({})",
                    field.name(),
                    values_shape,
                    grid_shape
                ),
            ));
        }
        if field.grid() != grid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Field {} is defined on a different grid than the one being written",
                    field.name()
                ),
            ));
        }
        if field.name().is_empty() || !names.insert(field.name()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Field names must be non-empty and unique, got {:?}",
                    field.name()
                ),
            ));
        }
    }
    Ok(())
}

/// Name and values of an array to write, in point order.
struct ArrayToWrite<'a, F> {
    name: &'a str,
    values: &'a [F],
}

impl<'a, F: VtkFloat> ArrayToWrite<'a, F> {
    fn appended_block_size(&self) -> u64 {
        (mem::size_of::<u64>() + self.values.len() * mem::size_of::<F>()) as u64
    }

    fn write_element<W: Write>(
        &self,
        xml_writer: &mut EventWriter<W>,
        encoding: Encoding,
        offset: u64,
    ) -> Result<(), xml::writer::Error> {
        let offset_string = offset.to_string();
        let mut event = XmlEvent::start_element("DataArray")
            .attr("type", F::TYPE_NAME)
            .attr("Name", self.name)
            .attr("NumberOfComponents", "1")
            .attr("format", encoding.format_attribute());
        if encoding == Encoding::RawAppended {
            event = event.attr("offset", &offset_string);
        }
        xml_writer.write(event)?;
        if encoding == Encoding::Ascii {
            let text = self
                .values
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            xml_writer.write(XmlEvent::characters(&text))?;
        }
        xml_writer.write(XmlEvent::end_element())?;
        Ok(())
    }

    fn write_appended_block<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let n_bytes = self.values.len() * mem::size_of::<F>();
        let mut byte_buffer = vec![0_u8; mem::size_of::<u64>() + n_bytes];
        let (header, data) = byte_buffer.split_at_mut(mem::size_of::<u64>());
        LittleEndian::write_u64(header, n_bytes as u64);
        F::write_into_byte_buffer(self.values, data);
        writer.write_all(&byte_buffer)
    }
}

fn write_document<F, W>(
    xml_writer: &mut EventWriter<W>,
    grid: &RectilinearGrid3<F>,
    fields: &[&ScalarField3<F>],
    encoding: Encoding,
) -> Result<(), xml::writer::Error>
where
    F: VtkFloat,
    W: Write,
{
    let shape = grid.shape();
    let extent = Dim3::slice()
        .iter()
        .map(|&dim| format!("0 {}", shape[dim] - 1))
        .collect::<Vec<_>>()
        .join(" ");

    let coordinate_arrays: Vec<_> = Dim3::slice()
        .iter()
        .map(|&dim| ArrayToWrite {
            name: COORDINATE_ARRAY_NAMES[dim.num()],
            values: grid.axis(dim),
        })
        .collect();
    let point_data_arrays: Vec<_> = fields
        .iter()
        .map(|field| ArrayToWrite {
            name: field.name(),
            values: field.values_in_point_order(),
        })
        .collect();

    // Appended blocks are laid out with the coordinates first.
    let mut offsets = Vec::with_capacity(coordinate_arrays.len() + point_data_arrays.len());
    let mut next_offset = 0;
    for array in coordinate_arrays.iter().chain(point_data_arrays.iter()) {
        offsets.push(next_offset);
        next_offset += array.appended_block_size();
    }
    let (coordinate_offsets, point_data_offsets) = offsets.split_at(coordinate_arrays.len());

    xml_writer.write(
        XmlEvent::start_element("VTKFile")
            .attr("type", "RectilinearGrid")
            .attr("version", "1.0")
            .attr("byte_order", "LittleEndian")
            .attr("header_type", "UInt64"),
    )?;
    xml_writer.write(XmlEvent::start_element("RectilinearGrid").attr("WholeExtent", &extent))?;
    xml_writer.write(XmlEvent::start_element("Piece").attr("Extent", &extent))?;

    let mut point_data_event = XmlEvent::start_element("PointData");
    if let Some(first_field) = fields.first() {
        point_data_event = point_data_event.attr("Scalars", first_field.name());
    }
    xml_writer.write(point_data_event)?;
    for (array, &offset) in point_data_arrays.iter().zip(point_data_offsets) {
        array.write_element(xml_writer, encoding, offset)?;
    }
    xml_writer.write(XmlEvent::end_element())?;

    xml_writer.write(XmlEvent::start_element("Coordinates"))?;
    for (array, &offset) in coordinate_arrays.iter().zip(coordinate_offsets) {
        array.write_element(xml_writer, encoding, offset)?;
    }
    xml_writer.write(XmlEvent::end_element())?;

    xml_writer.write(XmlEvent::end_element())?; // Piece
    xml_writer.write(XmlEvent::end_element())?; // RectilinearGrid

    if encoding == Encoding::RawAppended {
        xml_writer.write(XmlEvent::start_element("AppendedData").attr("encoding", "raw"))?;
        // The underscore marks the start of the binary data, which must
        // follow it directly without any formatting.
        xml_writer.write(XmlEvent::characters("_"))?;
        for array in coordinate_arrays.iter().chain(point_data_arrays.iter()) {
            array.write_appended_block(xml_writer.inner_mut())?;
        }
        xml_writer.write(XmlEvent::end_element())?;
    }

    xml_writer.write(XmlEvent::end_element())?; // VTKFile
    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        field::{FieldNames, UnfoldingFields},
        geometry::In3D,
        unfolding::PitchforkUnfolding,
    };
    use ndarray::Array3;
    use std::sync::Arc;

    fn small_fields() -> UnfoldingFields<f64> {
        let grid = Arc::new(
            RectilinearGrid3::from_cubically_remapped_bounds(In3D::new(3, 4, 5), -3.0, 3.0)
                .unwrap(),
        );
        UnfoldingFields::evaluate(
            grid,
            &PitchforkUnfolding,
            &FieldNames::default(),
            &Verbosity::Quiet,
        )
    }

    fn write_to_string(fields: &UnfoldingFields<f64>, encoding: Encoding) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_rectilinear_grid(&mut bytes, fields.grid(), &fields.in_output_order(), encoding)
            .unwrap();
        bytes
    }

    #[test]
    fn header_describes_extent_and_arrays() {
        let fields = small_fields();
        let bytes = write_to_string(&fields, Encoding::Ascii);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(r#"type="RectilinearGrid""#));
        assert!(text.contains(r#"WholeExtent="0 2 0 3 0 4""#));
        assert!(text.contains(r#"Scalars="G""#));
        for name in ["G", "stability", "G_x"]
            .iter()
            .chain(COORDINATE_ARRAY_NAMES.iter())
        {
            assert!(text.contains(&format!(r#"Name="{}""#, name)));
        }
        assert!(!text.contains("AppendedData"));
        let g_position = text.find(r#"Name="G""#).unwrap();
        let stability_position = text.find(r#"Name="stability""#).unwrap();
        let g_x_position = text.find(r#"Name="G_x""#).unwrap();
        assert!(g_position < stability_position && stability_position < g_x_position);
    }

    #[test]
    fn appended_blocks_follow_underscore_marker() {
        let fields = small_fields();
        let bytes = write_to_string(&fields, Encoding::RawAppended);
        let marker = b"<AppendedData encoding=\"raw\">_";
        let start = bytes
            .windows(marker.len())
            .position(|window| window == marker)
            .unwrap()
            + marker.len();

        // First block holds the x-coordinates.
        let n_x_bytes = LittleEndian::read_u64(&bytes[start..start + 8]);
        assert_eq!(n_x_bytes, 3 * 8);
        let first_x = LittleEndian::read_f64(&bytes[start + 8..start + 16]);
        assert_eq!(first_x, -3.0);

        // Three coordinate blocks and three field blocks.
        let n_data_bytes = (8 + 3 * 8) + (8 + 4 * 8) + (8 + 5 * 8) + 3 * (8 + 60 * 8);
        let end = start + n_data_bytes;
        assert!(bytes[end..].starts_with(b"</AppendedData>"));

        let header = String::from_utf8_lossy(&bytes[..start]);
        assert!(header.contains(r#"offset="0""#));
        assert!(header.contains(&format!(r#"offset="{}""#, (8 + 3 * 8) + (8 + 4 * 8))));
    }

    #[test]
    fn mismatched_field_shape_is_an_error() {
        let fields = small_fields();
        let other_grid = Arc::new(
            RectilinearGrid3::from_cubically_remapped_bounds(In3D::new(5, 4, 3), -3.0, 3.0)
                .unwrap(),
        );
        let foreign_field =
            ScalarField3::new("G".to_string(), other_grid, Array3::zeros((5, 4, 3)));
        let err = write_rectilinear_grid(
            Vec::new(),
            fields.grid(),
            &[&foreign_field],
            Encoding::RawAppended,
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn field_on_other_grid_of_same_shape_is_an_error() {
        let fields = small_fields();
        let other_grid = Arc::new(
            RectilinearGrid3::from_cubically_remapped_bounds(In3D::new(3, 4, 5), -1.0, 1.0)
                .unwrap(),
        );
        let foreign_field =
            ScalarField3::new("G".to_string(), other_grid, Array3::zeros((3, 4, 5)));
        let err = write_rectilinear_grid(
            Vec::new(),
            fields.grid(),
            &[&foreign_field],
            Encoding::Ascii,
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn duplicate_field_names_are_an_error() {
        let fields = small_fields();
        let err = write_rectilinear_grid(
            Vec::new(),
            fields.grid(),
            &[&fields.value, &fields.value],
            Encoding::Ascii,
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("broken.vtr");
        let fields = small_fields();
        let other_grid = Arc::new(
            RectilinearGrid3::from_cubically_remapped_bounds(In3D::new(2, 2, 2), -3.0, 3.0)
                .unwrap(),
        );
        let foreign_field =
            ScalarField3::new("G".to_string(), other_grid, Array3::zeros((2, 2, 2)));
        let result = write_rectilinear_grid_file(
            &output_path,
            fields.grid(),
            &[&foreign_field],
            Encoding::RawAppended,
            OverwriteMode::Always,
            &Verbosity::Quiet,
        );
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn existing_file_is_kept_when_overwriting_is_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("existing.vtr");
        std::fs::write(&output_path, b"keep").unwrap();
        let fields = small_fields();
        let written = write_rectilinear_grid_file(
            &output_path,
            fields.grid(),
            &fields.in_output_order(),
            Encoding::RawAppended,
            OverwriteMode::Never,
            &Verbosity::Quiet,
        )
        .unwrap();
        assert!(!written);
        assert_eq!(std::fs::read(&output_path).unwrap(), b"keep");
    }

    #[test]
    fn encoding_parses_from_cli_names() {
        assert_eq!("raw".parse::<Encoding>(), Ok(Encoding::RawAppended));
        assert_eq!("ascii".parse::<Encoding>(), Ok(Encoding::Ascii));
        assert!("base64".parse::<Encoding>().is_err());
    }
}
