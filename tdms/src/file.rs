use crate::{
    channel_data::ChannelData,
    data_type::DataType,
    error::{TdmsError, TdmsResult},
    loader::Loader,
    path::ObjectPath,
    property::{Property, set_property},
    segment::{DataBlock, LeadIn, ObjectMetadata, RawDataIndex, RawIndexEntry, layout_segment},
};
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};
use tracing::{debug, trace, warn};

/// A named channel: a fixed-length sequence of samples inside a group.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    group: String,
    properties: Vec<Property>,
    data_type: Option<DataType>,
    len: u64,
    blocks: Vec<DataBlock>,
    last_index: Option<RawDataIndex>,
}

impl Channel {
    fn new(group: &str, name: String) -> Self {
        Self {
            name,
            group: group.to_owned(),
            properties: Vec::new(),
            data_type: None,
            len: 0,
            blocks: Vec::new(),
            last_index: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_name(&self) -> &str {
        &self.group
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// `None` if the channel never had any raw data.
    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// The number of samples in the channel.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn path(&self) -> String {
        format!("/'{}'/'{}'", self.group, self.name)
    }

    fn set_index(&mut self, index: RawDataIndex) -> TdmsResult<()> {
        match self.data_type {
            Some(previous) if previous != index.data_type => {
                return Err(TdmsError::InconsistentDataType {
                    path: self.path(),
                    previous,
                    current: index.data_type,
                });
            }
            _ => self.data_type = Some(index.data_type),
        }
        self.last_index = Some(index);
        Ok(())
    }

    /// Adds a block of values, which must lie before `segment_end`.
    fn push_block(&mut self, block: DataBlock, segment_end: u64) -> TdmsResult<()> {
        let value_size = self.data_type.and_then(|data_type| data_type.size());
        match value_size.and_then(|size| block.end(size)) {
            Some(end) if end <= segment_end => {}
            _ => return Err(TdmsError::BlockOutOfBounds { path: self.path() }),
        }
        self.len = self
            .len
            .checked_add(block.count)
            .ok_or_else(|| TdmsError::SizeOverflow(self.path()))?;
        self.blocks.push(block);
        Ok(())
    }
}

/// A named group of channels.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    properties: Vec<Property>,
    channels: Vec<Channel>,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> TdmsResult<&Channel> {
        self.channels
            .iter()
            .find(|channel| channel.name == name)
            .ok_or_else(|| TdmsError::ChannelNotFound {
                group: self.name.clone(),
                channel: name.to_owned(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectLocation {
    Root,
    Group(usize),
    Channel(usize, usize),
}

/// An object in a segment's object list, which determines the raw data layout.
#[derive(Debug, Clone, Copy)]
struct ActiveObject {
    location: ObjectLocation,
    index: Option<RawDataIndex>,
}

/// A TDMS file whose metadata has been indexed.
/// Sample data is only read when a channel is materialized with [TdmsFile::read].
pub struct TdmsFile<R> {
    reader: R,
    properties: Vec<Property>,
    groups: Vec<Group>,
    number_of_segments: usize,
}

impl TdmsFile<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> TdmsResult<Self> {
        let file = File::open(path.as_ref())?;
        debug!("Opened {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> TdmsFile<R> {
    /// Reads the metadata of every segment in `reader`.
    pub fn from_reader(mut reader: R) -> TdmsResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        let mut file = Self {
            reader,
            properties: Vec::new(),
            groups: Vec::new(),
            number_of_segments: 0,
        };

        let mut active = Vec::<ActiveObject>::new();
        let mut position = 0;
        while position < file_size {
            if file_size - position < LeadIn::SIZE {
                warn!(
                    "Ignoring {} trailing bytes too short for a segment",
                    file_size - position
                );
                break;
            }
            position = file.index_segment(position, file_size, &mut active)?;
            file.number_of_segments += 1;
        }
        debug!(
            "Indexed {} segments, {} groups",
            file.number_of_segments,
            file.groups.len()
        );
        Ok(file)
    }

    /// Indexes the segment starting at `position`, returning the start of the next.
    fn index_segment(
        &mut self,
        position: u64,
        file_size: u64,
        active: &mut Vec<ActiveObject>,
    ) -> TdmsResult<u64> {
        self.reader.seek(SeekFrom::Start(position))?;
        let lead_in = LeadIn::load(&mut self.reader, position)?;
        trace!("Segment at byte {position}: {lead_in:?}");
        if lead_in.toc.has_daqmx_raw_data() {
            return Err(TdmsError::DaqmxUnsupported(format!(
                "segment at byte {position}"
            )));
        }
        let segment_end = lead_in.segment_end(position, file_size);

        if lead_in.toc.has_metadata() {
            if lead_in.toc.has_new_object_list() {
                active.clear();
            }
            let objects = Loader::new(&mut self.reader, lead_in.toc.endianness())
                .load_segment_metadata()?;
            for object in objects {
                self.register_object(object, active)?;
            }
        }

        if lead_in.toc.has_raw_data() {
            let data_start = lead_in.data_start(position, segment_end);
            let (locations, indices): (Vec<_>, Vec<_>) = active
                .iter()
                .filter_map(|object| match (object.location, object.index) {
                    (ObjectLocation::Channel(group, channel), Some(index)) => {
                        Some(((group, channel), index))
                    }
                    _ => None,
                })
                .unzip();
            let blocks = layout_segment(
                &indices,
                data_start,
                segment_end - data_start,
                lead_in.toc.is_interleaved(),
                lead_in.toc.endianness(),
            )?;
            for ((group, channel), channel_blocks) in locations.into_iter().zip(blocks) {
                if let Some(channel) = self
                    .groups
                    .get_mut(group)
                    .and_then(|group| group.channels.get_mut(channel))
                {
                    for block in channel_blocks {
                        channel.push_block(block, segment_end)?;
                    }
                }
            }
        }
        Ok(segment_end)
    }

    fn register_object(
        &mut self,
        object: ObjectMetadata,
        active: &mut Vec<ActiveObject>,
    ) -> TdmsResult<()> {
        let location = match ObjectPath::parse(&object.path)? {
            ObjectPath::Root => {
                for property in object.properties {
                    set_property(&mut self.properties, property);
                }
                ObjectLocation::Root
            }
            ObjectPath::Group(name) => {
                let group_index = self.group_index_or_insert(name);
                if let Some(group) = self.groups.get_mut(group_index) {
                    for property in object.properties {
                        set_property(&mut group.properties, property);
                    }
                }
                ObjectLocation::Group(group_index)
            }
            ObjectPath::Channel { group, channel } => {
                let group_index = self.group_index_or_insert(group);
                let channel_index = self.channel_index_or_insert(group_index, channel);
                if let Some(channel) = self
                    .groups
                    .get_mut(group_index)
                    .and_then(|group| group.channels.get_mut(channel_index))
                {
                    for property in object.properties {
                        set_property(&mut channel.properties, property);
                    }
                }
                ObjectLocation::Channel(group_index, channel_index)
            }
        };

        let index = match object.raw_index {
            RawIndexEntry::None => None,
            RawIndexEntry::SameAsPrevious => Some(
                self.channel_at(location)
                    .and_then(|channel| channel.last_index)
                    .ok_or_else(|| TdmsError::MissingPreviousIndex(object.path.clone()))?,
            ),
            RawIndexEntry::Explicit(index) => {
                self.channel_at_mut(location)
                    .ok_or_else(|| TdmsError::RawDataOnNonChannel(object.path.clone()))?
                    .set_index(index)?;
                Some(index)
            }
        };

        match active.iter_mut().find(|active| active.location == location) {
            Some(existing) => existing.index = index,
            None => active.push(ActiveObject { location, index }),
        }
        Ok(())
    }

    fn group_index_or_insert(&mut self, name: String) -> usize {
        match self.groups.iter().position(|group| group.name == name) {
            Some(index) => index,
            None => {
                self.groups.push(Group {
                    name,
                    properties: Vec::new(),
                    channels: Vec::new(),
                });
                self.groups.len() - 1
            }
        }
    }

    fn channel_index_or_insert(&mut self, group_index: usize, name: String) -> usize {
        let Some(group) = self.groups.get_mut(group_index) else {
            return 0;
        };
        match group.channels.iter().position(|channel| channel.name == name) {
            Some(index) => index,
            None => {
                let channel = Channel::new(&group.name, name);
                group.channels.push(channel);
                group.channels.len() - 1
            }
        }
    }

    fn channel_at(&self, location: ObjectLocation) -> Option<&Channel> {
        match location {
            ObjectLocation::Channel(group, channel) => self
                .groups
                .get(group)
                .and_then(|group| group.channels.get(channel)),
            _ => None,
        }
    }

    fn channel_at_mut(&mut self, location: ObjectLocation) -> Option<&mut Channel> {
        match location {
            ObjectLocation::Channel(group, channel) => self
                .groups
                .get_mut(group)
                .and_then(|group| group.channels.get_mut(channel)),
            _ => None,
        }
    }

    /// Properties of the file (root) object.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> TdmsResult<&Group> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .ok_or_else(|| TdmsError::GroupNotFound(name.to_owned()))
    }

    pub fn number_of_segments(&self) -> usize {
        self.number_of_segments
    }

    /// Materializes every sample of a channel.
    pub fn read(&mut self, group: &str, channel: &str) -> TdmsResult<ChannelData> {
        let Self { reader, groups, .. } = self;
        let channel = groups
            .iter()
            .find(|g| g.name == group)
            .ok_or_else(|| TdmsError::GroupNotFound(group.to_owned()))?
            .channel(channel)?;
        read_channel(reader, channel)
    }
}

fn read_channel<R: Read + Seek>(reader: &mut R, channel: &Channel) -> TdmsResult<ChannelData> {
    let Some(data_type) = channel.data_type else {
        return Ok(ChannelData::Empty);
    };
    let size = data_type
        .size()
        .ok_or(TdmsError::UnsupportedDataType(data_type))?;
    let capacity =
        usize::try_from(channel.len).map_err(|_| TdmsError::SizeOverflow(channel.path()))?;
    let mut data = ChannelData::with_capacity(data_type, capacity)?;

    let mut bytes = Vec::new();
    for block in &channel.blocks {
        reader.seek(SeekFrom::Start(block.offset))?;
        if block.stride == size {
            bytes.resize((block.count * size) as usize, 0);
            reader.read_exact(&mut bytes)?;
            data.extend_from_bytes(&bytes, block.endianness)?;
        } else {
            // Interleaved: read the span of rows and pick out this channel's column.
            let span = (block.count - 1) * block.stride + size;
            bytes.resize(span as usize, 0);
            reader.read_exact(&mut bytes)?;
            let column: Vec<u8> = bytes
                .chunks(block.stride as usize)
                .flat_map(|row| row.iter().take(size as usize).copied())
                .collect();
            data.extend_from_bytes(&column, block.endianness)?;
        }
    }
    Ok(data)
}
