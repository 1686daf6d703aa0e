//! Reading of VTK XML rectilinear grid files produced by this crate.

use crate::geometry::{
    Coords3,
    Dim3::{self, X, Y, Z},
    In3D,
};
use byteorder::{ByteOrder, LittleEndian};
use std::{fs, io, mem, path::Path};
use xml::reader::{EventReader, XmlEvent};

const APPENDED_DATA_TAG: &[u8] = b"<AppendedData";

/// Grid coordinates and point data read from a rectilinear grid file.
///
/// Values are converted to `f64` regardless of the precision in the file.
#[derive(Clone, Debug)]
pub struct RectilinearGridFileContent {
    shape: In3D<usize>,
    coords: Coords3<f64>,
    point_data: Vec<(String, Vec<f64>)>,
}

impl RectilinearGridFileContent {
    /// Returns the number of grid nodes along each dimension.
    pub fn shape(&self) -> &In3D<usize> {
        &self.shape
    }

    /// Returns the node coordinates along each dimension.
    pub fn coords(&self) -> &Coords3<f64> {
        &self.coords
    }

    /// Returns the names of the point data arrays, in file order.
    pub fn point_data_names(&self) -> Vec<&str> {
        self.point_data
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Returns the values of the point data array with the given name,
    /// in VTK point order (x-index fastest).
    pub fn point_data(&self, name: &str) -> Option<&[f64]> {
        self.point_data
            .iter()
            .find(|(array_name, _)| array_name == name)
            .map(|(_, values)| values.as_slice())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScalarType {
    Float32,
    Float64,
}

impl ScalarType {
    fn from_type_name(type_name: &str) -> io::Result<Self> {
        match type_name {
            "Float32" => Ok(Self::Float32),
            "Float64" => Ok(Self::Float64),
            other => Err(invalid_data(format!("Unsupported data type {}", other))),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Float32 => mem::size_of::<f32>(),
            Self::Float64 => mem::size_of::<f64>(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HeaderType {
    UInt32,
    UInt64,
}

impl HeaderType {
    fn size(&self) -> usize {
        match self {
            Self::UInt32 => mem::size_of::<u32>(),
            Self::UInt64 => mem::size_of::<u64>(),
        }
    }

    fn read(&self, bytes: &[u8]) -> usize {
        match self {
            Self::UInt32 => LittleEndian::read_u32(bytes) as usize,
            Self::UInt64 => LittleEndian::read_u64(bytes) as usize,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    PointData,
    Coordinates,
    Other,
}

#[derive(Clone, Debug)]
enum ArraySource {
    Ascii(String),
    Appended(usize),
}

#[derive(Clone, Debug)]
struct ArrayDescriptor {
    name: String,
    section: Section,
    scalar_type: ScalarType,
    source: ArraySource,
}

/// Reads the rectilinear grid file at the given path.
///
/// Both inline ASCII arrays and raw appended little-endian arrays are supported.
pub fn read_rectilinear_grid_file<P: AsRef<Path>>(
    file_path: P,
) -> io::Result<RectilinearGridFileContent> {
    let bytes = fs::read(file_path)?;
    parse_rectilinear_grid(&bytes)
}

/// Parses the content of a rectilinear grid file.
pub fn parse_rectilinear_grid(bytes: &[u8]) -> io::Result<RectilinearGridFileContent> {
    // The binary part of the file is not valid XML, so only the header is
    // handed to the XML parser, with the root element closed artificially.
    let (header, appended_data) = match find_subslice(bytes, APPENDED_DATA_TAG) {
        Some(tag_start) => {
            let marker = tag_start
                + bytes[tag_start..]
                    .iter()
                    .position(|&byte| byte == b'_')
                    .ok_or_else(|| invalid_data("Missing start marker of appended data"))?;
            let mut header = bytes[..tag_start].to_vec();
            header.extend_from_slice(b"</VTKFile>");
            (header, Some(&bytes[marker + 1..]))
        }
        None => (bytes.to_vec(), None),
    };

    let (shape, header_type, descriptors) = parse_header(&header)?;

    let mut coords = Vec::with_capacity(3);
    let mut point_data = Vec::new();
    for descriptor in descriptors {
        let values = match &descriptor.source {
            ArraySource::Ascii(text) => parse_ascii_values(&descriptor.name, text)?,
            ArraySource::Appended(offset) => read_appended_values(
                &descriptor,
                *offset,
                header_type,
                appended_data
                    .ok_or_else(|| invalid_data("Appended array without appended data"))?,
            )?,
        };
        match descriptor.section {
            Section::Coordinates => coords.push((descriptor.name, values)),
            Section::PointData => point_data.push((descriptor.name, values)),
            Section::Other => {}
        }
    }

    if coords.len() != 3 {
        return Err(invalid_data(format!(
            "Expected 3 coordinate arrays, found {}",
            coords.len()
        )));
    }
    let mut coords = coords.into_iter();
    let mut next_axis = |dim: Dim3| -> io::Result<Vec<f64>> {
        let (name, values) = coords.next().unwrap_or_default();
        if values.len() != shape[dim] {
            return Err(invalid_data(format!(
                "Coordinate array {} has {} values, but the extent has {} nodes along {}",
                name,
                values.len(),
                shape[dim],
                dim
            )));
        }
        Ok(values)
    };
    let coords = Coords3::new(next_axis(X)?, next_axis(Y)?, next_axis(Z)?);

    let n_points = shape[X] * shape[Y] * shape[Z];
    for (name, values) in &point_data {
        if values.len() != n_points {
            return Err(invalid_data(format!(
                "Point data array {} has {} values, but the grid has {} points",
                name,
                values.len(),
                n_points
            )));
        }
    }

    Ok(RectilinearGridFileContent {
        shape,
        coords,
        point_data,
    })
}

fn parse_header(header: &[u8]) -> io::Result<(In3D<usize>, HeaderType, Vec<ArrayDescriptor>)> {
    let mut shape = None;
    let mut header_type = HeaderType::UInt32;
    let mut descriptors = Vec::new();
    let mut section = Section::Other;
    let mut current_array: Option<ArrayDescriptor> = None;

    for event in EventReader::new(header) {
        match event.map_err(|err| invalid_data(err.to_string()))? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                let attribute = |attribute_name: &str| {
                    attributes
                        .iter()
                        .find(|attribute| attribute.name.local_name == attribute_name)
                        .map(|attribute| attribute.value.as_str())
                };
                match name.local_name.as_str() {
                    "VTKFile" => {
                        if attribute("type") != Some("RectilinearGrid") {
                            return Err(invalid_data("File does not contain a rectilinear grid"));
                        }
                        if let Some(byte_order) = attribute("byte_order") {
                            if byte_order != "LittleEndian" {
                                return Err(invalid_data(format!(
                                    "Unsupported byte order {}",
                                    byte_order
                                )));
                            }
                        }
                        header_type = match attribute("header_type") {
                            None | Some("UInt32") => HeaderType::UInt32,
                            Some("UInt64") => HeaderType::UInt64,
                            Some(other) => {
                                return Err(invalid_data(format!(
                                    "Unsupported header type {}",
                                    other
                                )))
                            }
                        };
                    }
                    "RectilinearGrid" => {
                        let extent = attribute("WholeExtent")
                            .ok_or_else(|| invalid_data("Missing WholeExtent attribute"))?;
                        shape = Some(parse_extent(extent)?);
                    }
                    "PointData" => section = Section::PointData,
                    "Coordinates" => section = Section::Coordinates,
                    "CellData" => section = Section::Other,
                    "DataArray" => {
                        if attribute("NumberOfComponents").map_or(false, |n| n != "1") {
                            return Err(invalid_data("Only scalar data arrays are supported"));
                        }
                        let scalar_type = ScalarType::from_type_name(
                            attribute("type")
                                .ok_or_else(|| invalid_data("Missing type of data array"))?,
                        )?;
                        let source = match attribute("format") {
                            Some("ascii") => ArraySource::Ascii(String::new()),
                            Some("appended") => ArraySource::Appended(
                                attribute("offset")
                                    .ok_or_else(|| invalid_data("Missing offset of data array"))?
                                    .parse()
                                    .map_err(|err| {
                                        invalid_data(format!("Invalid offset: {}", err))
                                    })?,
                            ),
                            other => {
                                return Err(invalid_data(format!(
                                    "Unsupported data array format {:?}",
                                    other
                                )))
                            }
                        };
                        current_array = Some(ArrayDescriptor {
                            name: attribute("Name").unwrap_or_default().to_string(),
                            section,
                            scalar_type,
                            source,
                        });
                    }
                    _ => {}
                }
            }
            XmlEvent::Characters(text) => {
                if let Some(ArrayDescriptor {
                    source: ArraySource::Ascii(content),
                    ..
                }) = current_array.as_mut()
                {
                    content.push_str(&text);
                    content.push(' ');
                }
            }
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "DataArray" => descriptors.extend(current_array.take()),
                "PointData" | "Coordinates" | "CellData" => section = Section::Other,
                _ => {}
            },
            _ => {}
        }
    }

    let shape = shape.ok_or_else(|| invalid_data("Missing RectilinearGrid element"))?;
    Ok((shape, header_type, descriptors))
}

fn parse_extent(extent: &str) -> io::Result<In3D<usize>> {
    let bounds = extent
        .split_whitespace()
        .map(|bound| bound.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| invalid_data(format!("Invalid extent {}: {}", extent, err)))?;
    if bounds.len() != 6 || bounds.chunks(2).any(|pair| pair[1] < pair[0]) {
        return Err(invalid_data(format!("Invalid extent {}", extent)));
    }
    Ok(In3D::new(
        bounds[1] - bounds[0] + 1,
        bounds[3] - bounds[2] + 1,
        bounds[5] - bounds[4] + 1,
    ))
}

fn parse_ascii_values(name: &str, text: &str) -> io::Result<Vec<f64>> {
    text.split_whitespace()
        .map(|value| value.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| invalid_data(format!("Invalid value in data array {}: {}", name, err)))
}

fn read_appended_values(
    descriptor: &ArrayDescriptor,
    offset: usize,
    header_type: HeaderType,
    appended_data: &[u8],
) -> io::Result<Vec<f64>> {
    let truncated = || {
        invalid_data(format!(
            "Appended data for array {} is truncated",
            descriptor.name
        ))
    };
    let header_end = offset + header_type.size();
    let n_bytes = header_type.read(appended_data.get(offset..header_end).ok_or_else(truncated)?);
    let data = appended_data
        .get(header_end..header_end + n_bytes)
        .ok_or_else(truncated)?;

    let value_size = descriptor.scalar_type.size();
    if n_bytes % value_size != 0 {
        return Err(invalid_data(format!(
            "Size of appended array {} is not a multiple of the value size",
            descriptor.name
        )));
    }
    let n_values = n_bytes / value_size;
    Ok(match descriptor.scalar_type {
        ScalarType::Float32 => {
            let mut values = vec![0.0_f32; n_values];
            LittleEndian::read_f32_into(data, &mut values);
            values.into_iter().map(f64::from).collect()
        }
        ScalarType::Float64 => {
            let mut values = vec![0.0_f64; n_values];
            LittleEndian::read_f64_into(data, &mut values);
            values
        }
    })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn invalid_data<S: Into<String>>(message: S) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}
