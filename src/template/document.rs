use std::{
    fs,
    io::{self, Cursor, Read, Seek, Write},
    path::Path,
};

use log::debug;
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

/// Часть пакета с основным текстом документа.
pub const DOCUMENT_PART: &str = "word/document.xml";

pub const BODY: &str = "w:body";
pub const PARAGRAPH: &str = "w:p";
pub const TABLE: &str = "w:tbl";
pub const ROW: &str = "w:tr";
pub const CELL: &str = "w:tc";

const PARAGRAPH_PROPERTIES: &str = "w:pPr";
const RUN: &str = "w:r";
const RUN_PROPERTIES: &str = "w:rPr";
const TEXT: &str = "w:t";
const TAB: &str = "w:tab";
const BREAK: &str = "w:br";
const CARRIAGE_RETURN: &str = "w:cr";
const BREAK_TYPE: &str = "w:type";
const TEXT_WRAPPING: &str = "textWrapping";

/// Элементы, внутри которых лежат прогоны с текстом параграфа.
const TEXT_CONTAINERS: [&str; 7] = [
    RUN,
    "w:hyperlink",
    "w:smartTag",
    "w:ins",
    "w:fldSimple",
    "w:sdt",
    "w:sdtContent",
];

/// Встроенные объекты. Их содержимое (например, текст надписей) не относится
/// к тексту параграфа, а сами они переживают перезапись текста.
const EMBEDDED_OBJECTS: [&str; 4] = ["w:drawing", "w:pict", "w:object", "mc:AlternateContent"];

/// Документ Word, загруженный в память.
/// Разбирается только `word/document.xml`, остальные части пакета
/// при сохранении копируются без изменений.
#[derive(Debug, Clone)]
pub struct Document {
    package: Vec<u8>,
    root: Element,
    body: Element,
    body_index: usize,
}

impl Document {
    /// Загружает документ из файла.
    pub fn open(path: &Path) -> DocumentResult<Self> {
        debug!("Load document from {:?}", path);
        let package = fs::read(path)?;
        Self::from_bytes(package)
    }

    /// Загружает документ из содержимого `.docx` файла.
    pub fn from_bytes(package: Vec<u8>) -> DocumentResult<Self> {
        let xml = {
            let mut archive = ZipArchive::new(Cursor::new(package.as_slice()))?;
            let mut part = archive.by_name(DOCUMENT_PART)?;
            let mut xml = String::with_capacity(part.size() as usize);
            part.read_to_string(&mut xml)?;
            xml
        };

        let mut root = parse(&xml)?;

        let missing_body =
            || DocumentError::Malformed(format!("{} has no {} element", DOCUMENT_PART, BODY));

        let body_index = root
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name == BODY))
            .ok_or_else(missing_body)?;

        let Node::Element(body) = root.children.remove(body_index) else {
            return Err(missing_body());
        };

        Ok(Self {
            package,
            root,
            body,
            body_index,
        })
    }

    /// Сохраняет документ в файл.
    pub fn save(&self, path: &Path) -> DocumentResult<()> {
        debug!("Save document to {:?}", path);
        let file = fs::File::create(path)?;
        self.write_to(file)
    }

    /// Пишет документ как `.docx` пакет.
    pub fn write_to<W: Write + Seek>(&self, out: W) -> DocumentResult<()> {
        let mut root = self.root.clone();
        root.children.insert(self.body_index, Node::Element(self.body.clone()));
        let xml = root.to_xml()?;

        let mut archive = ZipArchive::new(Cursor::new(self.package.as_slice()))?;
        let mut zip = ZipWriter::new(out);

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;

            if entry.name() == DOCUMENT_PART {
                let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
                zip.start_file(DOCUMENT_PART, options)?;
                zip.write_all(&xml)?;
            } else {
                zip.raw_copy_file(entry)?;
            }
        }

        zip.finish()?;

        Ok(())
    }

    /// Тело документа.
    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Element {
        &mut self.body
    }

    /// Текст документа в порядке следования блоков.
    /// Строки таблиц собираются из непустых ячеек через табуляцию.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();

        for block in self.body().elements() {
            match block.name.as_str() {
                PARAGRAPH => {
                    let text = block.paragraph_text();
                    let text = text.trim();
                    if !text.is_empty() {
                        lines.push(text.to_owned());
                    }
                }
                TABLE => {
                    for row in block.children(ROW) {
                        let line = row
                            .children(CELL)
                            .map(|cell| cell.cell_text().trim().to_owned())
                            .filter(|text| !text.is_empty())
                            .collect::<Vec<_>>()
                            .join("\t");
                        if !line.is_empty() {
                            lines.push(line);
                        }
                    }
                }
                _ => {}
            }
        }

        lines.join("\n")
    }
}

/// Узел XML дерева.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Элемент XML дерева.
/// Имена хранятся вместе с префиксом пространства имён, как в исходном файле.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_owned(), value.to_owned()));
        self
    }

    fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_owned()));
        self
    }

    /// Дочерние элементы.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Дочерние элементы с указанным именем.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn children_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.children.iter_mut().filter_map(move |n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Оставляет только первые `keep` дочерних элементов с указанным именем.
    pub fn truncate_children(&mut self, name: &str, keep: usize) {
        let mut seen = 0;
        self.children.retain(|n| match n {
            Node::Element(e) if e.name == name => {
                seen += 1;
                seen <= keep
            }
            _ => true,
        });
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Все элементы с указанным именем на любой глубине.
    /// Внутрь найденных элементов поиск не спускается.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for e in self.elements() {
            if e.name == name {
                found.push(e);
            } else {
                e.collect_descendants(name, found);
            }
        }
    }

    /// Текст параграфа: все текстовые фрагменты его прогонов.
    pub fn paragraph_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, text: &mut String) {
        for e in self.elements() {
            e.append_text(text);
        }
    }

    fn append_text(&self, text: &mut String) {
        match self.name.as_str() {
            TEXT => {
                for node in &self.children {
                    if let Node::Text(t) = node {
                        text.push_str(t);
                    }
                }
            }
            TAB => text.push('\t'),
            BREAK if !self.is_layout_break() => text.push('\n'),
            CARRIAGE_RETURN => text.push('\n'),
            name if TEXT_CONTAINERS.contains(&name) => self.collect_text(text),
            _ => {}
        }
    }

    fn has_text(&self) -> bool {
        let mut text = String::new();
        self.append_text(&mut text);
        !text.is_empty()
    }

    /// Разрыв страницы или колонки. В текст параграфа не попадает.
    fn is_layout_break(&self) -> bool {
        self.name == BREAK
            && self
                .attributes
                .iter()
                .any(|(k, v)| k == BREAK_TYPE && v != TEXT_WRAPPING)
    }

    fn has_embedded(&self) -> bool {
        EMBEDDED_OBJECTS.contains(&self.name.as_str())
            || self.is_layout_break()
            || self.elements().any(|e| e.has_embedded())
    }

    fn is_text_piece(&self) -> bool {
        match self.name.as_str() {
            TEXT | TAB | CARRIAGE_RETURN => true,
            BREAK => !self.is_layout_break(),
            _ => false,
        }
    }

    /// Убирает текстовые фрагменты, встроенные объекты остаются на месте.
    fn strip_text(&mut self) {
        self.children.retain(|n| match n {
            Node::Element(e) => !e.is_text_piece(),
            Node::Text(_) => true,
        });

        for node in &mut self.children {
            if let Node::Element(e) = node {
                if TEXT_CONTAINERS.contains(&e.name.as_str()) {
                    e.strip_text();
                }
            }
        }
    }

    /// Текст ячейки таблицы: тексты её параграфов через перевод строки.
    pub fn cell_text(&self) -> String {
        self.children(PARAGRAPH)
            .map(|p| p.paragraph_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Заменяет текст параграфа одним прогоном с указанным текстом.
    /// Свойства параграфа и оформление первого прогона сохраняются.
    /// Прогоны с рисунками, надписями и разрывами страниц остаются на своих
    /// местах без текста, новый прогон встаёт перед первым текстовым.
    pub fn set_paragraph_text(&mut self, text: &str) {
        let run_properties = self
            .child(RUN)
            .and_then(|r| r.child(RUN_PROPERTIES))
            .cloned();

        let mut kept = Vec::with_capacity(self.children.len());
        let mut insert_at = None;

        for node in std::mem::take(&mut self.children) {
            let Node::Element(mut e) = node else { continue };

            if e.name == PARAGRAPH_PROPERTIES {
                kept.push(Node::Element(e));
                continue;
            }

            if insert_at.is_none() && e.has_text() {
                insert_at = Some(kept.len());
            }

            if e.has_embedded() {
                e.strip_text();
                kept.push(Node::Element(e));
            }
        }

        let mut run = Element::new(RUN);
        if let Some(rpr) = run_properties {
            run.push(rpr);
        }

        let mut chunk = String::new();
        for c in text.chars() {
            match c {
                '\t' | '\n' => {
                    push_text(&mut run, &chunk);
                    chunk.clear();
                    run.push(Element::new(if c == '\t' { TAB } else { BREAK }));
                }
                _ => chunk.push(c),
            }
        }
        push_text(&mut run, &chunk);

        let at = insert_at.unwrap_or(kept.len());
        kept.insert(at, Node::Element(run));
        self.children = kept;
    }

    fn to_xml(&self) -> DocumentResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        self.write(&mut writer)?;
        Ok(writer.into_inner())
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>) -> DocumentResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for node in &self.children {
            match node {
                Node::Element(e) => e.write(writer)?,
                Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;

        Ok(())
    }

    fn from_start(start: &BytesStart) -> DocumentResult<Self> {
        let mut element = Element::new(&String::from_utf8_lossy(start.name().as_ref()));

        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }

        Ok(element)
    }
}

fn push_text(run: &mut Element, text: &str) {
    if text.is_empty() {
        return;
    }

    run.push(
        Element::new(TEXT)
            .with_attribute("xml:space", "preserve")
            .with_text(text),
    );
}

/// Разбирает XML в дерево элементов.
/// Объявление, комментарии и инструкции обработки отбрасываются.
pub fn parse(xml: &str) -> DocumentResult<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Element::from_start(&e)?),
            Event::Empty(e) => {
                let element = Element::from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DocumentError::Malformed("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(e.unescape()?.into_owned()));
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DocumentError::Malformed("unclosed element".into()));
    }

    root.ok_or_else(|| DocumentError::Malformed("no root element".into()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> DocumentResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(DocumentError::Malformed("more than one root element".into())),
    }

    Ok(())
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("read document: {0}")]
    Io(#[from] io::Error),

    #[error("docx package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("document xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    Malformed(String),
}
