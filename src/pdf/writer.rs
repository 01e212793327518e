//! Serialises a [`Composition`] into PDF bytes with lopdf.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::fonts::{encode_win_ansi, Font};
use super::layout::{Color, Composition, Element, PAGE_HEIGHT, PAGE_WIDTH};
use super::PdfError;

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn name(n: &str) -> Object {
    Object::Name(n.as_bytes().to_vec())
}

fn fill_color(color: Color) -> Operation {
    Operation::new("rg", vec![real(color.r), real(color.g), real(color.b)])
}

fn font_dictionary(font: Font) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

pub fn write(composition: &Composition) -> Result<Vec<u8>, PdfError> {
    if composition.pages.is_empty() {
        return Err(PdfError::Write("document has no pages".into()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(Font::Regular));
    let bold_id = doc.add_object(font_dictionary(Font::Bold));

    // Each template image becomes one XObject shared by every page using it
    let mut image_ids: BTreeMap<&'static str, (String, ObjectId)> = BTreeMap::new();
    for (index, (template, image)) in composition.images.iter().enumerate() {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(image.width as i64),
                "Height" => Object::Integer(image.height as i64),
                "ColorSpace" => image.color_space(),
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => "DCTDecode",
            },
            image.data.clone(),
        )
        .with_compression(false);
        let id = doc.add_object(stream);
        image_ids.insert(template, (format!("Im{}", index + 1), id));
    }

    let mut kids: Vec<Object> = Vec::with_capacity(composition.pages.len());
    for page in &composition.pages {
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();

        for element in &page.elements {
            match element {
                Element::Image {
                    template,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let Some((resource, id)) = image_ids.get(template) else {
                        log::warn!("Template {} referenced but not loaded; skipping", template);
                        continue;
                    };
                    xobjects.set(resource.as_str(), Object::Reference(*id));
                    operations.push(Operation::new("q", vec![]));
                    operations.push(Operation::new(
                        "cm",
                        vec![real(*width), real(0.0), real(0.0), real(*height), real(*x), real(*y)],
                    ));
                    operations.push(Operation::new("Do", vec![name(resource)]));
                    operations.push(Operation::new("Q", vec![]));
                }
                Element::Rect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    operations.push(fill_color(*color));
                    operations.push(Operation::new(
                        "re",
                        vec![real(*x), real(*y), real(*width), real(*height)],
                    ));
                    operations.push(Operation::new("f", vec![]));
                }
                Element::Text {
                    text,
                    x,
                    y,
                    size,
                    font,
                    color,
                } => {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new(
                        "Tf",
                        vec![name(font.resource_name()), real(*size)],
                    ));
                    operations.push(fill_color(*color));
                    operations.push(Operation::new("Td", vec![real(*x), real(*y)]));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::string_literal(encode_win_ansi(text))],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
            }
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| PdfError::Write(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let resources = dictionary! {
            "Font" => dictionary! {
                Font::Regular.resource_name() => regular_id,
                Font::Bold.resource_name() => bold_id,
            },
            "XObject" => xobjects,
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(bytes)
}
